use crate::db::DbPool;
use crate::error::CoreError;
use crate::events::{Notifier, TaskEvent};
use crate::models::{
    Attachment, Category, Comment, CompletionResult, DeletionResult, NewAttachmentData,
    NewCategoryData, NewPersonData, NewTaskData, Person, Task, TaskFilter, UpdateTaskData,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub mod attachments;
pub mod categories;
pub mod comments;
pub mod materialization;
pub mod people;
pub mod query_builder;
pub mod tasks;

/// Domain-specific trait for task operations
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    /// Tasks whose hex id starts or ends with `short_id` (hyphens ignored).
    async fn find_tasks_by_short_id(&self, short_id: &str) -> Result<Vec<Task>, CoreError>;
    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError>;
    /// Every task sharing `group_id`, ordered by occurrence number.
    async fn find_series_tasks(&self, group_id: Uuid) -> Result<Vec<Task>, CoreError>;
    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError>;
    /// Marks the task complete and materializes the next occurrence of its series.
    async fn complete_task(&self, id: Uuid) -> Result<CompletionResult, CoreError>;
    async fn uncomplete_task(&self, id: Uuid) -> Result<Task, CoreError>;
    /// Soft-deletes the task. An unfinished recurring task still hands its
    /// series on to a successor.
    async fn delete_task(&self, id: Uuid) -> Result<DeletionResult, CoreError>;
    async fn assigned_people(&self, task_id: Uuid) -> Result<Vec<Person>, CoreError>;
}

/// Domain-specific trait for household members
#[async_trait]
pub trait PersonRepository {
    async fn add_person(&self, data: NewPersonData) -> Result<Person, CoreError>;
    async fn find_person_by_id(&self, id: Uuid) -> Result<Option<Person>, CoreError>;
    async fn find_person_by_name(&self, name: &str) -> Result<Option<Person>, CoreError>;
    async fn find_people(&self) -> Result<Vec<Person>, CoreError>;
    async fn delete_person(&self, id: Uuid) -> Result<(), CoreError>;
}

#[async_trait]
pub trait CategoryRepository {
    async fn add_category(&self, data: NewCategoryData) -> Result<Category, CoreError>;
    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<Category>, CoreError>;
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, CoreError>;
    async fn find_categories(&self) -> Result<Vec<Category>, CoreError>;
    async fn delete_category(&self, id: Uuid) -> Result<(), CoreError>;
}

#[async_trait]
pub trait AttachmentRepository {
    async fn add_attachment(&self, data: NewAttachmentData) -> Result<Attachment, CoreError>;
    async fn find_attachments(&self, task_id: Uuid) -> Result<Vec<Attachment>, CoreError>;
}

#[async_trait]
pub trait CommentRepository {
    async fn add_comment(
        &self,
        task_id: Uuid,
        person_id: Option<Uuid>,
        body: String,
    ) -> Result<Comment, CoreError>;
    async fn find_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, CoreError>;
    async fn update_comment(&self, id: Uuid, body: String) -> Result<Comment, CoreError>;
    async fn delete_comment(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    TaskRepository + PersonRepository + CategoryRepository + AttachmentRepository + CommentRepository
{
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    notifier: Arc<dyn Notifier>,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Events are only published once the transaction producing them has committed.
    pub(crate) fn publish(&self, event: TaskEvent) {
        self.notifier.publish(event);
    }
}

impl Repository for SqliteRepository {}
