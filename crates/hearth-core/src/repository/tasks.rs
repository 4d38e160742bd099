use crate::error::CoreError;
use crate::events::TaskEvent;
use crate::models::{
    CompletionResult, DeletionResult, NewTaskData, Person, Task, TaskFilter, UpdateTaskData,
};
use crate::recurrence::RecurrenceRule;
use crate::repository::query_builder::SqlQueryBuilder;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        let mut tx = self.pool().begin().await?;
        let task = Self::add_task_in_transaction(&mut tx, data).await?;
        tx.commit().await?;

        tracing::info!(task_id = %task.id, recurring = task.is_recurring(), "task created");
        self.publish(TaskEvent::TaskCreated(task.clone()));
        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks_by_short_id(&self, short_id: &str) -> Result<Vec<Task>, CoreError> {
        let hex = short_id.replace('-', "").to_lowercase();
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = sqlx::query_as(
            "SELECT * FROM tasks WHERE lower(hex(id)) LIKE $1 OR lower(hex(id)) LIKE $2",
        )
        .bind(format!("{}%", hex))
        .bind(format!("%{}", hex))
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError> {
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT t.* FROM tasks t WHERE 1 = 1");
        SqlQueryBuilder::push_task_filter(filter, Utc::now(), &mut query_builder);
        SqlQueryBuilder::push_task_ordering(&mut query_builder);

        let tasks = query_builder.build_query_as().fetch_all(self.pool()).await?;
        Ok(tasks)
    }

    async fn find_series_tasks(&self, group_id: Uuid) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as(
            "SELECT * FROM tasks WHERE recurring_group_id = $1 ORDER BY recurring_occurrence",
        )
        .bind(group_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        let mut tx = self.pool().begin().await?;

        Self::find_live_task_in_transaction(&mut tx, id).await?;
        Self::update_task_fields(&mut tx, id, &data, Utc::now()).await?;

        if let Some(people) = &data.assigned_people {
            sqlx::query("DELETE FROM task_assignments WHERE task_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::assign_people_in_transaction(&mut tx, id, people, Utc::now()).await?;
        }

        let updated_task = Self::find_live_task_in_transaction(&mut tx, id).await?;
        tx.commit().await?;

        self.publish(TaskEvent::TaskUpdated(updated_task.clone()));
        Ok(updated_task)
    }

    async fn complete_task(&self, id: Uuid) -> Result<CompletionResult, CoreError> {
        self.complete_task_at(id, Utc::now()).await
    }

    async fn uncomplete_task(&self, id: Uuid) -> Result<Task, CoreError> {
        let mut tx = self.pool().begin().await?;
        // `finalized` stays set, so completing again will not spawn a second successor
        let task: Task = sqlx::query_as(
            r#"UPDATE tasks
            SET completed = 0, completed_at = NULL, updated_at = $1
            WHERE id = $2 AND deleted = 0
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        tx.commit().await?;

        tracing::info!(task_id = %id, "task reopened");
        self.publish(TaskEvent::TaskUncompleted(task.clone()));
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> Result<DeletionResult, CoreError> {
        self.delete_task_at(id, Utc::now()).await
    }

    async fn assigned_people(&self, task_id: Uuid) -> Result<Vec<Person>, CoreError> {
        let people = sqlx::query_as(
            r#"SELECT p.* FROM people p
            INNER JOIN task_assignments a ON a.person_id = p.id
            WHERE a.task_id = $1
            ORDER BY p.name"#,
        )
        .bind(task_id)
        .fetch_all(self.pool())
        .await?;
        Ok(people)
    }
}

impl SqliteRepository {
    /// Completes a task as of `now`.
    ///
    /// The finalize claim, the successor and the completion itself commit
    /// together. Only the first lifecycle trigger to claim a task materializes
    /// its successor; reopening and completing again never spawns twice.
    pub async fn complete_task_at(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CompletionResult, CoreError> {
        let mut tx = self.pool().begin().await?;

        // Claim first: the write takes SQLite's lock before the row is read
        let claimed = Self::claim_in_transaction(&mut tx, id).await?;
        let task = Self::find_live_task_in_transaction(&mut tx, id).await?;
        if task.completed {
            return Err(CoreError::AlreadyCompleted(task.title));
        }

        let next = if claimed {
            Self::materialize_next_in_transaction(&mut tx, &task, now).await?
        } else {
            None
        };

        let completed: Task = sqlx::query_as(
            r#"UPDATE tasks
            SET completed = 1, completed_at = $1, updated_at = $1
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(task_id = %id, spawned = next.is_some(), "task completed");
        if let Some(next) = &next {
            self.publish(TaskEvent::TaskCreated(next.clone()));
        }
        self.publish(TaskEvent::TaskCompleted(completed.clone()));

        Ok(CompletionResult { completed, next })
    }

    /// Soft-deletes a task as of `now`, handing an unfinished series on first.
    pub async fn delete_task_at(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DeletionResult, CoreError> {
        let mut tx = self.pool().begin().await?;

        let claimed = Self::claim_in_transaction(&mut tx, id).await?;
        let task = Self::find_live_task_in_transaction(&mut tx, id).await?;

        let next = if claimed {
            Self::materialize_next_in_transaction(&mut tx, &task, now).await?
        } else {
            None
        };

        let deleted: Task = sqlx::query_as(
            r#"UPDATE tasks
            SET deleted = 1, deleted_at = $1, updated_at = $1
            WHERE id = $2 AND deleted = 0
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        tx.commit().await?;

        tracing::info!(task_id = %id, spawned = next.is_some(), "task deleted");
        if let Some(next) = &next {
            self.publish(TaskEvent::TaskCreated(next.clone()));
        }
        self.publish(TaskEvent::TaskDeleted { id });

        Ok(DeletionResult { deleted, next })
    }

    /// Compare-and-set on `finalized`. Returns whether this caller won the claim.
    async fn claim_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "UPDATE tasks SET finalized = 1 WHERE id = $1 AND finalized = 0 AND deleted = 0",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Fetches a task that exists and has not been soft-deleted.
    pub(crate) async fn find_live_task_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
    ) -> Result<Task, CoreError> {
        sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND deleted = 0")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    /// Add a task within an existing transaction
    pub(crate) async fn add_task_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        data: NewTaskData,
    ) -> Result<Task, CoreError> {
        let title = data.title.trim();
        if title.is_empty() {
            return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
        }
        if let Some(rule) = &data.recurrence {
            rule.validate()?;
        }
        if let Some(category_id) = data.category_id {
            Self::ensure_category_exists(tx, category_id).await?;
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::now_v7(),
            title: title.to_string(),
            description: data.description,
            category_id: data.category_id,
            priority: data.priority.unwrap_or_default(),
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
            recurrence: data.recurrence.unwrap_or_default(),
            ..Task::default()
        };

        Self::insert_task_in_transaction(tx, &task).await?;
        Self::assign_people_in_transaction(tx, task.id, &data.assigned_people, now).await?;

        Ok(task)
    }

    /// Writes a fully built task row, including its rule and series state.
    pub(crate) async fn insert_task_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        task: &Task,
    ) -> Result<(), CoreError> {
        let rule = &task.recurrence;
        sqlx::query(
            r#"INSERT INTO tasks (
                id, title, description, category_id, priority, due_date,
                completed, completed_at, deleted, deleted_at, finalized, created_at, updated_at,
                recurring_pattern, recurring_interval, recurring_unit, recurring_days, recurring_from,
                recurring_end_date, recurring_end_count, recurring_copy_attachments,
                recurring_occurrence, recurring_group_id, parent_task_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.category_id)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(task.completed)
        .bind(task.completed_at)
        .bind(task.deleted)
        .bind(task.deleted_at)
        .bind(task.finalized)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(rule.legacy_pattern)
        .bind(i64::from(rule.interval))
        .bind(rule.unit)
        .bind(days_to_json(rule)?)
        .bind(rule.anchor)
        .bind(rule.end_date)
        .bind(rule.end_count.map(i64::from))
        .bind(rule.copy_attachments)
        .bind(i64::from(task.series.occurrence_number))
        .bind(task.series.group_id)
        .bind(task.series.parent_task_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub(crate) async fn assign_people_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        task_id: Uuid,
        people: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if people.is_empty() {
            return Ok(());
        }

        let mut unique = people.to_vec();
        unique.sort();
        unique.dedup();

        for person_id in &unique {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM people WHERE id = $1 AND deleted = 0")
                    .bind(person_id)
                    .fetch_optional(&mut **tx)
                    .await?;
            if exists.is_none() {
                return Err(CoreError::NotFound(format!("Person {}", person_id)));
            }
        }

        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO task_assignments (task_id, person_id, assigned_at) ");
        query_builder.push_values(unique.iter(), |mut b, person_id| {
            b.push_bind(task_id).push_bind(*person_id).push_bind(now);
        });
        query_builder.build().execute(&mut **tx).await?;

        Ok(())
    }

    async fn ensure_category_exists<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        category_id: Uuid,
    ) -> Result<(), CoreError> {
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM categories WHERE id = $1 AND deleted = 0")
                .bind(category_id)
                .fetch_optional(&mut **tx)
                .await?;
        exists
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("Category {}", category_id)))
    }

    /// Applies the present fields of `data`. `updated_at` is always bumped.
    pub(crate) async fn update_task_fields<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
        data: &UpdateTaskData,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if let Some(Some(category_id)) = data.category_id {
            Self::ensure_category_exists(tx, category_id).await?;
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET updated_at = ");
        qb.push_bind(now);

        if let Some(title) = &data.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
            }
            qb.push(", title = ");
            qb.push_bind(title.to_string());
        }

        if let Some(description) = &data.description {
            qb.push(", description = ");
            qb.push_bind(description.clone());
        }

        if let Some(category_id) = data.category_id {
            qb.push(", category_id = ");
            qb.push_bind(category_id);
        }

        if let Some(priority) = data.priority {
            qb.push(", priority = ");
            qb.push_bind(priority);
        }

        if let Some(due_date) = data.due_date {
            qb.push(", due_date = ");
            qb.push_bind(due_date);
        }

        if let Some(recurrence) = &data.recurrence {
            let rule = recurrence.clone().unwrap_or_default();
            rule.validate()?;
            qb.push(", recurring_pattern = ");
            qb.push_bind(rule.legacy_pattern);
            qb.push(", recurring_interval = ");
            qb.push_bind(i64::from(rule.interval));
            qb.push(", recurring_unit = ");
            qb.push_bind(rule.unit);
            qb.push(", recurring_days = ");
            qb.push_bind(days_to_json(&rule)?);
            qb.push(", recurring_from = ");
            qb.push_bind(rule.anchor);
            qb.push(", recurring_end_date = ");
            qb.push_bind(rule.end_date);
            qb.push(", recurring_end_count = ");
            qb.push_bind(rule.end_count.map(i64::from));
            qb.push(", recurring_copy_attachments = ");
            qb.push_bind(rule.copy_attachments);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

fn days_to_json(rule: &RecurrenceRule) -> Result<Option<String>, CoreError> {
    Ok(rule
        .days_of_week
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}
