use anyhow::{anyhow, Result};
use hearth_core::error::CoreError;
use hearth_core::models::{Category, Person};
use hearth_core::repository::Repository;
use uuid::Uuid;

pub async fn resolve_task_id(repo: &impl Repository, short_id: &str) -> Result<Uuid> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let tasks = repo.find_tasks_by_short_id(short_id).await?;
    if tasks.len() == 1 {
        Ok(tasks[0].id)
    } else if tasks.is_empty() {
        Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID '{}'",
            short_id
        ))))
    } else {
        let task_info: Vec<(String, String)> = tasks
            .into_iter()
            .map(|t| (t.id.to_string(), t.title))
            .collect();
        Err(anyhow!(CoreError::AmbiguousId(task_info)))
    }
}

pub async fn resolve_person(repo: &impl Repository, name: &str) -> Result<Person> {
    repo.find_person_by_name(name)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("No person named '{}'", name))))
}

pub async fn resolve_people(repo: &impl Repository, names: &[String]) -> Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(resolve_person(repo, name).await?.id);
    }
    Ok(ids)
}

pub async fn resolve_category(repo: &impl Repository, name: &str) -> Result<Category> {
    repo.find_category_by_name(name)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("No category named '{}'", name))))
}

/// Last eight hex digits of an id, as shown in listings. The leading digits
/// of a v7 id are a timestamp and repeat across tasks created together.
pub fn short_id(id: &Uuid) -> String {
    let hex = id.simple().to_string();
    hex[hex.len() - 8..].to_string()
}
