use crate::error::CoreError;
use crate::models::Comment;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::CommentRepository for SqliteRepository {
    async fn add_comment(
        &self,
        task_id: Uuid,
        person_id: Option<Uuid>,
        body: String,
    ) -> Result<Comment, CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::InvalidInput("Comment cannot be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;
        Self::find_live_task_in_transaction(&mut tx, task_id).await?;

        let now = Utc::now();
        let comment = sqlx::query_as(
            r#"INSERT INTO task_comments (id, task_id, person_id, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(task_id)
        .bind(person_id)
        .bind(body)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(comment)
    }

    async fn find_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, CoreError> {
        let comments =
            sqlx::query_as("SELECT * FROM task_comments WHERE task_id = $1 ORDER BY created_at")
                .bind(task_id)
                .fetch_all(self.pool())
                .await?;
        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, body: String) -> Result<Comment, CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::InvalidInput("Comment cannot be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;
        let comment: Comment = sqlx::query_as(
            "UPDATE task_comments SET body = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(body)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Comment {}", id)))?;
        tx.commit().await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM task_comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Comment {}", id)));
        }
        Ok(())
    }
}
