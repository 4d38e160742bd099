use crate::error::CoreError;
use crate::models::{Attachment, NewAttachmentData};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::AttachmentRepository for SqliteRepository {
    async fn add_attachment(&self, data: NewAttachmentData) -> Result<Attachment, CoreError> {
        if data.filename.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "Attachment filename cannot be empty".to_string(),
            ));
        }

        let mut tx = self.pool().begin().await?;
        Self::find_live_task_in_transaction(&mut tx, data.task_id).await?;

        let attachment = sqlx::query_as(
            r#"INSERT INTO task_attachments (id, task_id, filename, original_name, mime_type, size, uploaded_by, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(data.task_id)
        .bind(data.filename)
        .bind(data.original_name)
        .bind(data.mime_type)
        .bind(data.size)
        .bind(data.uploaded_by)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attachment)
    }

    async fn find_attachments(&self, task_id: Uuid) -> Result<Vec<Attachment>, CoreError> {
        let attachments =
            sqlx::query_as("SELECT * FROM task_attachments WHERE task_id = $1 ORDER BY uploaded_at")
                .bind(task_id)
                .fetch_all(self.pool())
                .await?;
        Ok(attachments)
    }
}
