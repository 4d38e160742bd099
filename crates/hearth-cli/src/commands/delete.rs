use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use hearth_core::error::CoreError;
use hearth_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::DeleteCommand;
use crate::util::resolve_task_id;

pub async fn delete_task(repo: &impl Repository, command: DeleteCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    let task = repo
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Task '{}'", task_id))))?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete task '{}'?",
                task.title
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let result = repo.delete_task(task_id).await?;
    println!("Deleted task: '{}'", result.deleted.title);
    if let Some(next) = result.next {
        let due = next
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "no due date".to_string());
        println!("  {} Series continues with the occurrence due {}", "↻".blue(), due.cyan());
        println!("  {} Task ID: {}", "→".blue(), next.id.to_string().yellow());
    }

    Ok(())
}
