use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use hearth_core::models::{Category, Person, TaskPriority};
use uuid::Uuid;

use crate::util::short_id;

#[derive(Debug, Clone)]
pub struct ViewTask {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub deleted: bool,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub assignees: Vec<String>,
    pub recurrence: Option<String>,
}

pub fn display_tasks(tasks: &[ViewTask]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Priority", "Due", "Category", "Who", "Repeats"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let mut title = String::new();
        if task.recurrence.is_some() {
            title.push_str("↻ ");
        }
        title.push_str(&task.title);
        if task.deleted {
            title.push_str(" (deleted)");
        }

        let mut title_cell = Cell::new(title);
        if task.completed || task.deleted {
            title_cell = title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        } else {
            title_cell = match task.priority {
                TaskPriority::High => title_cell.fg(Color::Red).add_attribute(Attribute::Bold),
                TaskPriority::Medium => title_cell.fg(Color::Yellow),
                TaskPriority::Low => title_cell,
            };
        }
        row.add_cell(title_cell);
        row.add_cell(Cell::new(task.priority.to_string()));

        let due_cell = match task.due_date {
            Some(due) => {
                let cell = Cell::new(due.humanize());
                if task.completed {
                    cell
                } else if due < now {
                    cell.fg(Color::Red)
                } else if due.date_naive() == now.date_naive() {
                    cell.fg(Color::Yellow)
                } else {
                    cell
                }
            }
            None => Cell::new("-"),
        };
        row.add_cell(due_cell);

        row.add_cell(Cell::new(task.category.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(if task.assignees.is_empty() {
            "-".to_string()
        } else {
            task.assignees.join(", ")
        }));
        row.add_cell(Cell::new(task.recurrence.as_deref().unwrap_or("-")));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_people(people: &[Person]) {
    if people.is_empty() {
        println!("No people found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Email", "Color", "Joined"]);

    for person in people {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&person.id)));
        row.add_cell(Cell::new(&person.name));
        row.add_cell(Cell::new(person.email.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(person.color.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(person.created_at.humanize()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["", "Name", "Color", "Order"]);

    for category in categories {
        let mut row = Row::new();
        row.add_cell(Cell::new(&category.icon));
        row.add_cell(Cell::new(&category.name));
        row.add_cell(Cell::new(category.color.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(category.sort_order));
        table.add_row(row);
    }

    println!("{table}");
}
