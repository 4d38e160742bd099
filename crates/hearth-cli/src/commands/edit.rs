use anyhow::Result;
use hearth_core::models::UpdateTaskData;
use hearth_core::recurrence::parse_recurrence_settings;
use hearth_core::repository::Repository;

use crate::cli::EditCommand;
use crate::parser::{parse_due_date, recurrence_settings};
use crate::util::{resolve_category, resolve_people, resolve_task_id};

pub async fn edit_task(repo: &impl Repository, command: EditCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;

    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.map(Some)
    };

    let due_date = if command.due_clear {
        Some(None)
    } else if let Some(due_str) = command.due {
        Some(Some(parse_due_date(&due_str)?))
    } else {
        None
    };

    let category_id = if command.category_clear {
        Some(None)
    } else if let Some(name) = command.category {
        Some(Some(resolve_category(repo, &name).await?.id))
    } else {
        None
    };

    let assigned_people = if command.assign_clear {
        Some(Vec::new())
    } else if !command.assign.is_empty() {
        Some(resolve_people(repo, &command.assign).await?)
    } else {
        None
    };

    let recurrence = if command.recurrence_clear {
        Some(None)
    } else {
        match recurrence_settings(&command.recurrence)? {
            Some(settings) => Some(parse_recurrence_settings(&settings)?),
            None => None,
        }
    };

    let update_data = UpdateTaskData {
        title: command.title,
        description,
        category_id,
        priority: command.priority,
        due_date,
        recurrence,
        assigned_people,
    };

    let updated_task = repo.update_task(task_id, update_data).await?;
    println!("Updated task: '{}'", updated_task.title);

    Ok(())
}
