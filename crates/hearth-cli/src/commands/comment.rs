use anyhow::Result;
use hearth_core::repository::Repository;

use crate::cli::{CommentCommand, CommentSubcommand};
use crate::commands::show::print_comments;
use crate::util::{resolve_person, resolve_task_id};

pub async fn comment_command(repo: &impl Repository, command: CommentCommand) -> Result<()> {
    match command.command {
        CommentSubcommand::Add(add) => {
            let task_id = resolve_task_id(repo, &add.id).await?;
            let person_id = match add.by.as_deref() {
                Some(name) => Some(resolve_person(repo, name).await?.id),
                None => None,
            };
            repo.add_comment(task_id, person_id, add.body).await?;
            println!("Comment added.");
        }
        CommentSubcommand::List(show) => {
            let task_id = resolve_task_id(repo, &show.id).await?;
            let comments = repo.find_comments(task_id).await?;
            if comments.is_empty() {
                println!("No comments yet.");
            } else {
                print_comments(repo, &comments).await?;
            }
        }
    }
    Ok(())
}
