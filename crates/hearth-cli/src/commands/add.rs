use anyhow::Result;
use hearth_core::models::NewTaskData;
use hearth_core::recurrence::{parse_recurrence_settings, summarize, AnchorMode};
use hearth_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::parser::{parse_due_date, recurrence_settings};
use crate::util::{resolve_category, resolve_people};

pub async fn add_task(repo: &impl Repository, command: AddCommand) -> Result<()> {
    let due_date = command.due.as_deref().map(parse_due_date).transpose()?;

    let recurrence = match recurrence_settings(&command.recurrence)? {
        Some(settings) => parse_recurrence_settings(&settings)?,
        None => None,
    };

    let category_id = match command.category.as_deref() {
        Some(name) => Some(resolve_category(repo, name).await?.id),
        None => None,
    };
    let assigned_people = resolve_people(repo, &command.assign).await?;

    let task = repo
        .add_task(NewTaskData {
            title: command.title,
            description: command.description,
            category_id,
            priority: command.priority,
            due_date,
            recurrence,
            assigned_people,
        })
        .await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    println!(
        "{} Created task: {}",
        "✓".style(success_style),
        task.title.bright_white().bold()
    );
    println!(
        "  {} Task ID: {}",
        "→".style(info_style),
        task.id.to_string().yellow()
    );
    if let Some(due) = task.due_date {
        println!(
            "  {} Due: {}",
            "→".style(info_style),
            due.format("%Y-%m-%d %H:%M").to_string().cyan()
        );
    }
    if let Some(summary) = summarize(&task.recurrence, &task.series) {
        println!("  {} Repeats: {}", "↻".style(info_style), summary);
        if task.due_date.is_none() && task.recurrence.effective_anchor() == AnchorMode::DueDate {
            println!(
                "  {} No due date set, so no next occurrence will be created on completion.",
                "!".yellow()
            );
        }
    }

    Ok(())
}
