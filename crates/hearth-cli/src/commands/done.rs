use anyhow::Result;
use hearth_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::{DoneCommand, UndoCommand};
use crate::util::resolve_task_id;

pub async fn done_task(repo: &impl Repository, command: DoneCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    let result = repo.complete_task(task_id).await?;

    println!("{} Completed task: '{}'", "✓".green().bold(), result.completed.title);
    if let Some(next) = result.next {
        match next.due_date {
            Some(due) => println!(
                "  {} Next occurrence due {}",
                "↻".blue(),
                due.format("%Y-%m-%d %H:%M").to_string().cyan()
            ),
            None => println!("  {} Next occurrence created", "↻".blue()),
        }
        println!("  {} Task ID: {}", "→".blue(), next.id.to_string().yellow());
    }

    Ok(())
}

pub async fn undo_task(repo: &impl Repository, command: UndoCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    let task = repo.uncomplete_task(task_id).await?;
    println!("Reopened task: '{}'", task.title);
    if task.finalized && task.is_recurring() {
        println!(
            "  {}",
            "Completing it again will not create another occurrence.".bright_black()
        );
    }
    Ok(())
}
