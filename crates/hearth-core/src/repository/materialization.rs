use crate::error::CoreError;
use crate::models::{Attachment, Task};
use crate::recurrence::{has_ended, next_occurrence};
use crate::repository::SqliteRepository;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

impl SqliteRepository {
    /// Creates the next occurrence of `task`'s series inside the caller's transaction.
    ///
    /// `task` must be the row as it was before the triggering state change.
    /// Returns `None` when the task does not repeat, the series has ended or no
    /// next date exists. Any error leaves the transaction to be rolled back by
    /// the caller, so a partial successor is never committed.
    pub(crate) async fn materialize_next_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        task: &Task,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, CoreError> {
        if !task.is_recurring() {
            return Ok(None);
        }

        if has_ended(&task.recurrence, &task.series, now) {
            tracing::debug!(
                task_id = %task.id,
                occurrence = task.series.occurrence_number,
                "series has ended, no successor"
            );
            return Ok(None);
        }

        let Some(next_due) = next_occurrence(&task.recurrence, task.due_date, now) else {
            tracing::debug!(task_id = %task.id, "no next occurrence date, series stops");
            return Ok(None);
        };

        let next = Task {
            id: Uuid::now_v7(),
            title: task.title.clone(),
            description: task.description.clone(),
            category_id: task.category_id,
            priority: task.priority,
            due_date: Some(next_due),
            created_at: now,
            updated_at: now,
            recurrence: task.recurrence.clone(),
            series: task.series.successor(task.id),
            ..Task::default()
        };

        Self::insert_task_in_transaction(tx, &next).await?;

        if task.series.group_id.is_none() {
            sqlx::query("UPDATE tasks SET recurring_group_id = $1 WHERE id = $2")
                .bind(next.series.group_id)
                .bind(task.id)
                .execute(&mut **tx)
                .await?;
        }

        let assignments = sqlx::query(
            r#"INSERT INTO task_assignments (task_id, person_id, assigned_at)
            SELECT $1, person_id, $2 FROM task_assignments WHERE task_id = $3"#,
        )
        .bind(next.id)
        .bind(now)
        .bind(task.id)
        .execute(&mut **tx)
        .await?;

        let attachments = if task.recurrence.copy_attachments {
            Self::copy_attachments_in_transaction(tx, task.id, next.id).await?
        } else {
            0
        };

        tracing::info!(
            task_id = %task.id,
            next_id = %next.id,
            occurrence = next.series.occurrence_number,
            due = %next_due,
            assignments = assignments.rows_affected(),
            attachments,
            "materialized next occurrence"
        );

        Ok(Some(next))
    }

    /// Copies attachment metadata. The new rows reference the same stored files.
    async fn copy_attachments_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        from_task: Uuid,
        to_task: Uuid,
    ) -> Result<usize, CoreError> {
        let attachments: Vec<Attachment> =
            sqlx::query_as("SELECT * FROM task_attachments WHERE task_id = $1 ORDER BY uploaded_at")
                .bind(from_task)
                .fetch_all(&mut **tx)
                .await?;

        if attachments.is_empty() {
            return Ok(0);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO task_attachments (id, task_id, filename, original_name, mime_type, size, uploaded_by, uploaded_at) ",
        );
        query_builder.push_values(attachments.iter(), |mut b, attachment| {
            b.push_bind(Uuid::now_v7())
                .push_bind(to_task)
                .push_bind(&attachment.filename)
                .push_bind(&attachment.original_name)
                .push_bind(&attachment.mime_type)
                .push_bind(attachment.size)
                .push_bind(attachment.uploaded_by)
                .push_bind(attachment.uploaded_at);
        });
        query_builder.build().execute(&mut **tx).await?;

        Ok(attachments.len())
    }
}
