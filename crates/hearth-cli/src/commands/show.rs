use anyhow::{anyhow, Result};
use chrono_humanize::Humanize;
use hearth_core::error::CoreError;
use hearth_core::models::{Comment, Task};
use hearth_core::recurrence::summarize;
use hearth_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::ShowCommand;
use crate::util::{resolve_task_id, short_id};

pub async fn show_task(repo: &impl Repository, command: ShowCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    let task = repo
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Task '{}'", task_id))))?;

    println!("{}", task.title.bright_white().bold());
    println!("  ID:        {}", task.id.to_string().yellow());
    println!("  Status:    {}", status_label(&task));
    println!("  Priority:  {}", task.priority);
    if let Some(due) = task.due_date {
        println!(
            "  Due:       {} ({})",
            due.format("%Y-%m-%d %H:%M"),
            due.humanize()
        );
    }
    if let Some(category_id) = task.category_id {
        if let Some(category) = repo.find_category_by_id(category_id).await? {
            println!("  Category:  {} {}", category.icon, category.name);
        }
    }

    let people = repo.assigned_people(task.id).await?;
    if !people.is_empty() {
        let names: Vec<_> = people.into_iter().map(|p| p.name).collect();
        println!("  Assigned:  {}", names.join(", "));
    }
    if let Some(description) = &task.description {
        println!("\n{}", description);
    }

    if let Some(summary) = summarize(&task.recurrence, &task.series) {
        println!("\n{} {}", "↻".blue(), summary);
    }
    if let Some(group_id) = task.series.group_id {
        println!("{}", "Series:".bold());
        for member in repo.find_series_tasks(group_id).await? {
            let marker = if member.id == task.id { "▸" } else { " " };
            let due = member
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} #{:<3} {}  {}  {}",
                marker,
                member.series.occurrence_number,
                short_id(&member.id).yellow(),
                due,
                status_label(&member)
            );
        }
    }

    let attachments = repo.find_attachments(task.id).await?;
    if !attachments.is_empty() {
        println!("\n{}", "Attachments:".bold());
        for attachment in attachments {
            println!(
                "  {} {}",
                attachment.original_name.as_deref().unwrap_or(&attachment.filename),
                attachment.mime_type.as_deref().unwrap_or("").bright_black()
            );
        }
    }

    let comments = repo.find_comments(task.id).await?;
    if !comments.is_empty() {
        println!("\n{}", "Comments:".bold());
        print_comments(repo, &comments).await?;
    }

    Ok(())
}

pub(crate) async fn print_comments(repo: &impl Repository, comments: &[Comment]) -> Result<()> {
    for comment in comments {
        let author = match comment.person_id {
            Some(id) => repo.find_person_by_id(id).await?.map(|p| p.name),
            None => None,
        };
        println!(
            "  {} {}: {}",
            comment.created_at.humanize().bright_black(),
            author.as_deref().unwrap_or("someone").cyan(),
            comment.body
        );
    }
    Ok(())
}

fn status_label(task: &Task) -> &'static str {
    if task.deleted {
        "deleted"
    } else if task.completed {
        "done"
    } else {
        "open"
    }
}
