use crate::error::CoreError;
use crate::models::{Category, NewCategoryData};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::CategoryRepository for SqliteRepository {
    async fn add_category(&self, data: NewCategoryData) -> Result<Category, CoreError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Category name cannot be empty".to_string()));
        }
        // One statement: the unique index on live names rejects duplicates,
        // including a concurrent insert of the same name
        let mut tx = self.pool().begin().await?;
        let category: Category = sqlx::query_as(
            r#"INSERT INTO categories (id, name, icon, color, sort_order, created_at)
            VALUES (
                $1, $2, $3, $4,
                COALESCE($5, (SELECT MAX(sort_order) FROM categories WHERE deleted = 0) + 1, 1),
                $6
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(data.icon)
        .bind(data.color)
        .bind(data.sort_order)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                CoreError::InvalidInput(format!("Category '{}' already exists", name))
            }
            other => CoreError::Database(other),
        })?;
        tx.commit().await?;

        tracing::info!(category_id = %category.id, "category added");
        Ok(category)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<Category>, CoreError> {
        let category = sqlx::query_as("SELECT * FROM categories WHERE id = $1 AND deleted = 0")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(category)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, CoreError> {
        let category = sqlx::query_as(
            "SELECT * FROM categories WHERE name = $1 COLLATE NOCASE AND deleted = 0",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await?;
        Ok(category)
    }

    async fn find_categories(&self) -> Result<Vec<Category>, CoreError> {
        let categories =
            sqlx::query_as("SELECT * FROM categories WHERE deleted = 0 ORDER BY sort_order, name")
                .fetch_all(self.pool())
                .await?;
        Ok(categories)
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE categories SET deleted = 1, deleted_at = $1 WHERE id = $2 AND deleted = 0",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Category {}", id)));
        }
        Ok(())
    }
}
