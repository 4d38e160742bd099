use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::recurrence::{DayOfWeek, RecurrenceRule, SeriesState};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    /// Display colour, e.g. `#3B82F6`.
    pub color: Option<String>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: Option<String>,
    pub sort_order: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    #[default]
    Low,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::Low => write!(f, "low"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(TaskPriority::High),
            "medium" | "m" => Ok(TaskPriority::Medium),
            "low" | "l" => Ok(TaskPriority::Low),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Set once the task's completion or deletion has been processed; a
    /// finalized task never materializes a successor again.
    pub finalized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub recurrence: RecurrenceRule,
    pub series: SeriesState,
}

impl Task {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            title: "".to_string(),
            description: None,
            category_id: None,
            priority: TaskPriority::Low,
            due_date: None,
            completed: false,
            completed_at: None,
            deleted: false,
            deleted_at: None,
            finalized: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            recurrence: RecurrenceRule::default(),
            series: SeriesState::default(),
        }
    }
}

fn decode_error(column: &str, source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn try_get_u32(row: &SqliteRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|e| decode_error(column, e))
}

// The recurrence and series columns are flattened in the table but grouped on `Task`.
impl<'r> FromRow<'r, SqliteRow> for Task {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let days_of_week = row
            .try_get::<Option<String>, _>("recurring_days")?
            .map(|json| serde_json::from_str::<BTreeSet<DayOfWeek>>(&json))
            .transpose()
            .map_err(|e| decode_error("recurring_days", e))?;

        let end_count = row
            .try_get::<Option<i64>, _>("recurring_end_count")?
            .map(u32::try_from)
            .transpose()
            .map_err(|e| decode_error("recurring_end_count", e))?;

        let recurrence = RecurrenceRule {
            unit: row.try_get("recurring_unit")?,
            interval: try_get_u32(row, "recurring_interval")?,
            days_of_week,
            anchor: row.try_get("recurring_from")?,
            end_date: row.try_get("recurring_end_date")?,
            end_count,
            legacy_pattern: row.try_get("recurring_pattern")?,
            copy_attachments: row.try_get("recurring_copy_attachments")?,
        };

        let series = SeriesState {
            occurrence_number: try_get_u32(row, "recurring_occurrence")?,
            group_id: row.try_get("recurring_group_id")?,
            parent_task_id: row.try_get("parent_task_id")?,
        };

        Ok(Task {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category_id: row.try_get("category_id")?,
            priority: row.try_get("priority")?,
            due_date: row.try_get("due_date")?,
            completed: row.try_get("completed")?,
            completed_at: row.try_get("completed_at")?,
            deleted: row.try_get("deleted")?,
            deleted_at: row.try_get("deleted_at")?,
            finalized: row.try_get("finalized")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            recurrence,
            series,
        })
    }
}

/// Metadata for a file attached to a task. The bytes live in external storage
/// under `filename`; copies across a series share that reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub filename: String,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub person_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPersonData {
    pub name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCategoryData {
    pub name: String,
    pub icon: String,
    pub color: Option<String>,
    /// Appended after the last category when absent.
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAttachmentData {
    pub task_id: Uuid,
    pub filename: String,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    pub uploaded_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    /// Already validated, see [`crate::recurrence::parse_recurrence_settings`].
    pub recurrence: Option<RecurrenceRule>,
    pub assigned_people: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// `Some(None)` stops the task from repeating. Series bookkeeping is kept.
    pub recurrence: Option<Option<RecurrenceRule>>,
    /// Replaces the whole assignment set.
    pub assigned_people: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone)]
pub enum DueDate {
    Overdue,
    Today,
    Before(DateTime<Utc>),
    After(DateTime<Utc>),
}

/// Criteria for listing tasks. Every present field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub person_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub completed: Option<bool>,
    pub due: Option<DueDate>,
    pub include_deleted: bool,
}

#[derive(Debug)]
pub struct CompletionResult {
    pub completed: Task,
    /// The successor materialized by this completion, if the series continues.
    pub next: Option<Task>,
}

#[derive(Debug)]
pub struct DeletionResult {
    pub deleted: Task,
    pub next: Option<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("high", TaskPriority::High)]
    #[case("H", TaskPriority::High)]
    #[case("Medium", TaskPriority::Medium)]
    #[case("low", TaskPriority::Low)]
    fn test_priority_from_str(#[case] input: &str, #[case] expected: TaskPriority) {
        assert_eq!(input.parse::<TaskPriority>(), Ok(expected));
    }

    #[test]
    fn test_priority_rejects_unknown() {
        assert_eq!(
            "urgent".parse::<TaskPriority>(),
            Err(ParseTaskPriorityError("urgent".to_string()))
        );
        assert_eq!(TaskPriority::default(), TaskPriority::Low);
    }

    #[test]
    fn test_default_task_is_a_plain_first_occurrence() {
        let task = Task::default();
        assert!(!task.is_recurring());
        assert_eq!(task.series.occurrence_number, 1);
        assert!(!task.finalized);
    }
}
