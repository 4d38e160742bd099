use crate::error::CoreError;
use crate::models::{NewPersonData, Person};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::PersonRepository for SqliteRepository {
    async fn add_person(&self, data: NewPersonData) -> Result<Person, CoreError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Person name cannot be empty".to_string()));
        }

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;
        let person: Person = sqlx::query_as(
            r#"INSERT INTO people (id, name, email, photo_url, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(data.email)
        .bind(data.photo_url)
        .bind(data.color)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(person_id = %person.id, "person added");
        Ok(person)
    }

    async fn find_person_by_id(&self, id: Uuid) -> Result<Option<Person>, CoreError> {
        let person = sqlx::query_as("SELECT * FROM people WHERE id = $1 AND deleted = 0")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(person)
    }

    async fn find_person_by_name(&self, name: &str) -> Result<Option<Person>, CoreError> {
        let person = sqlx::query_as(
            "SELECT * FROM people WHERE name = $1 COLLATE NOCASE AND deleted = 0",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await?;
        Ok(person)
    }

    async fn find_people(&self) -> Result<Vec<Person>, CoreError> {
        let people = sqlx::query_as("SELECT * FROM people WHERE deleted = 0 ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(people)
    }

    async fn delete_person(&self, id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE people SET deleted = 1, deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted = 0",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Person {}", id)));
        }

        // A removed person drops off every open task
        sqlx::query(
            r#"DELETE FROM task_assignments
            WHERE person_id = $1
            AND task_id IN (SELECT id FROM tasks WHERE completed = 0 AND deleted = 0)"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(person_id = %id, "person removed");
        Ok(())
    }
}
