use crate::models::{DueDate, TaskFilter};
use chrono::{DateTime, Duration, Utc};
use sqlx::{QueryBuilder, Sqlite};

/// Utility functions for building task listing queries.
/// Expects a `SELECT ... FROM tasks t WHERE <condition>` prefix.
pub struct SqlQueryBuilder;

impl SqlQueryBuilder {
    /// Appends one `AND` clause per present filter field.
    pub fn push_task_filter<'a>(
        filter: &TaskFilter,
        now: DateTime<Utc>,
        qb: &mut QueryBuilder<'a, Sqlite>,
    ) {
        if !filter.include_deleted {
            qb.push(" AND t.deleted = 0");
        }

        if let Some(person_id) = filter.person_id {
            qb.push(" AND t.id IN (SELECT task_id FROM task_assignments WHERE person_id = ");
            qb.push_bind(person_id);
            qb.push(")");
        }

        if let Some(category_id) = filter.category_id {
            qb.push(" AND t.category_id = ");
            qb.push_bind(category_id);
        }

        if let Some(priority) = filter.priority {
            qb.push(" AND t.priority = ");
            qb.push_bind(priority);
        }

        if let Some(completed) = filter.completed {
            qb.push(" AND t.completed = ");
            qb.push_bind(completed);
        }

        if let Some(due) = &filter.due {
            Self::push_due_date_clause(due, now, qb);
        }
    }

    fn push_due_date_clause<'a>(due: &DueDate, now: DateTime<Utc>, qb: &mut QueryBuilder<'a, Sqlite>) {
        match due {
            DueDate::Overdue => {
                qb.push(" AND t.completed = 0 AND t.due_date < ");
                qb.push_bind(now);
            }
            DueDate::Today => {
                let start_of_day = now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .map(|naive| naive.and_utc())
                    .unwrap_or(now);
                qb.push(" AND t.due_date >= ");
                qb.push_bind(start_of_day);
                qb.push(" AND t.due_date < ");
                qb.push_bind(start_of_day + Duration::days(1));
            }
            DueDate::Before(date) => {
                qb.push(" AND t.due_date < ");
                qb.push_bind(*date);
            }
            DueDate::After(date) => {
                qb.push(" AND t.due_date > ");
                qb.push_bind(*date);
            }
        }
    }

    /// Open tasks first, then by due date (undated last), priority and age.
    pub fn push_task_ordering(qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(
            r#" ORDER BY t.completed,
                t.due_date IS NULL,
                t.due_date,
                CASE t.priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                t.created_at"#,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use uuid::Uuid;

    fn sql_for(filter: &TaskFilter) -> String {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT t.* FROM tasks t WHERE 1 = 1");
        SqlQueryBuilder::push_task_filter(filter, Utc::now(), &mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_default_filter_hides_deleted() {
        let sql = sql_for(&TaskFilter::default());
        assert!(sql.ends_with("WHERE 1 = 1 AND t.deleted = 0"));
    }

    #[test]
    fn test_include_deleted_drops_clause() {
        let sql = sql_for(&TaskFilter {
            include_deleted: true,
            ..TaskFilter::default()
        });
        assert!(!sql.contains("deleted"));
    }

    #[test]
    fn test_combined_filters() {
        let sql = sql_for(&TaskFilter {
            person_id: Some(Uuid::now_v7()),
            priority: Some(TaskPriority::High),
            completed: Some(false),
            due: Some(DueDate::Overdue),
            ..TaskFilter::default()
        });
        assert!(sql.contains("SELECT task_id FROM task_assignments WHERE person_id = ?"));
        assert!(sql.contains("t.priority = ?"));
        assert!(sql.contains("t.completed = ?"));
        assert!(sql.contains("t.due_date < ?"));
        assert!(!sql.contains("t.category_id"));
    }
}
