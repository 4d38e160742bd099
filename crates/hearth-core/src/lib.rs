//! # Hearth Core Library
//!
//! Storage and domain logic for a shared household task list: people,
//! categories, tasks with assignments, comments and attachment metadata.
//!
//! The centre of the crate is the recurring-task lifecycle. A task carries a
//! [`recurrence::RecurrenceRule`]; when it is completed or deleted the
//! repository materializes the next occurrence in the same transaction,
//! copying assignees (and optionally attachments) onto the new row.
//!
//! ## Core Modules
//!
//! - [`db`]: Connection pool and embedded migrations
//! - [`models`]: Entities and transfer objects
//! - [`recurrence`]: Rule model, next-date calculator, termination policy
//! - [`repository`]: Data access traits and their SQLite implementation
//! - [`events`]: Notifications published after each change
//! - [`error`]: The crate's error type
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hearth_core::{
//!     db,
//!     events::LogNotifier,
//!     models::NewTaskData,
//!     recurrence::{parse_recurrence_settings, RecurrenceSettings},
//!     repository::{SqliteRepository, TaskRepository},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hearth_core::error::CoreError> {
//!     let pool = db::establish_connection("hearth.db").await?;
//!     let repo = SqliteRepository::new(pool, Arc::new(LogNotifier));
//!
//!     let settings = RecurrenceSettings::from_json(
//!         r#"{"type":"weekly","days":["monday","thursday"]}"#,
//!     )?;
//!     let task = repo
//!         .add_task(NewTaskData {
//!             title: "Take out the bins".to_string(),
//!             due_date: Some(chrono::Utc::now()),
//!             recurrence: parse_recurrence_settings(&settings)?,
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let result = repo.complete_task(task.id).await?;
//!     if let Some(next) = result.next {
//!         println!("Next occurrence due {:?}", next.due_date);
//!     }
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod recurrence;
pub mod repository;
