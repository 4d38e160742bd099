use anyhow::Result;
use hearth_core::models::NewAttachmentData;
use hearth_core::repository::Repository;

use crate::cli::AttachCommand;
use crate::util::{resolve_person, resolve_task_id};

pub async fn attach_file(repo: &impl Repository, command: AttachCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    let uploaded_by = match command.by.as_deref() {
        Some(name) => Some(resolve_person(repo, name).await?.id),
        None => None,
    };

    let attachment = repo
        .add_attachment(NewAttachmentData {
            task_id,
            filename: command.filename,
            original_name: command.name,
            mime_type: command.mime,
            size: command.size,
            uploaded_by,
        })
        .await?;

    println!(
        "Attached '{}'",
        attachment
            .original_name
            .as_deref()
            .unwrap_or(&attachment.filename)
    );
    Ok(())
}
