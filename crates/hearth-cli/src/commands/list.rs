use std::collections::HashMap;

use anyhow::Result;
use hearth_core::models::{DueDate, Task, TaskFilter};
use hearth_core::recurrence::summarize;
use hearth_core::repository::Repository;

use crate::cli::ListCommand;
use crate::config::Config;
use crate::parser::{parse_filter_term, FilterTerm};
use crate::util::{resolve_category, resolve_person};
use crate::views::table::{display_tasks, ViewTask};

pub async fn list_tasks(repo: &impl Repository, command: ListCommand, config: &Config) -> Result<()> {
    let terms = if command.terms.is_empty() {
        &config.default_filters
    } else {
        &command.terms
    };
    let filter = build_filter(repo, terms).await?;

    let tasks = repo.find_tasks(&filter).await?;
    let categories: HashMap<_, _> = repo
        .find_categories()
        .await?
        .into_iter()
        .map(|c| (c.id, format!("{} {}", c.icon, c.name)))
        .collect();

    let mut view_tasks = Vec::with_capacity(tasks.len());
    for task in tasks {
        let assignees = repo
            .assigned_people(task.id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        view_tasks.push(to_view(task, &categories, assignees));
    }

    display_tasks(&view_tasks);

    Ok(())
}

async fn build_filter(repo: &impl Repository, terms: &[String]) -> Result<TaskFilter> {
    let mut filter = TaskFilter::default();
    for term in terms {
        match parse_filter_term(term)? {
            FilterTerm::Open => filter.completed = Some(false),
            FilterTerm::Done => filter.completed = Some(true),
            FilterTerm::Overdue => filter.due = Some(DueDate::Overdue),
            FilterTerm::Today => filter.due = Some(DueDate::Today),
            FilterTerm::Deleted => filter.include_deleted = true,
            FilterTerm::Priority(priority) => filter.priority = Some(priority),
            FilterTerm::Person(name) => filter.person_id = Some(resolve_person(repo, &name).await?.id),
            FilterTerm::Category(name) => {
                filter.category_id = Some(resolve_category(repo, &name).await?.id)
            }
        }
    }
    Ok(filter)
}

fn to_view(task: Task, categories: &HashMap<uuid::Uuid, String>, assignees: Vec<String>) -> ViewTask {
    let recurrence = summarize(&task.recurrence, &task.series);
    let category = task.category_id.and_then(|id| categories.get(&id).cloned());
    ViewTask {
        id: task.id,
        title: task.title,
        completed: task.completed,
        deleted: task.deleted,
        priority: task.priority,
        due_date: task.due_date,
        category,
        assignees,
        recurrence,
    }
}
