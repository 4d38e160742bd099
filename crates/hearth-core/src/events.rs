//! Change notifications published after a repository transaction commits.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::Task;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum TaskEvent {
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskCompleted(Task),
    TaskUncompleted(Task),
    TaskDeleted { id: Uuid },
}

impl TaskEvent {
    /// Stable wire name, e.g. `task-created`.
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated(_) => "task-created",
            TaskEvent::TaskUpdated(_) => "task-updated",
            TaskEvent::TaskCompleted(_) => "task-completed",
            TaskEvent::TaskUncompleted(_) => "task-uncompleted",
            TaskEvent::TaskDeleted { .. } => "task-deleted",
        }
    }

    pub fn task_id(&self) -> Uuid {
        match self {
            TaskEvent::TaskCreated(task)
            | TaskEvent::TaskUpdated(task)
            | TaskEvent::TaskCompleted(task)
            | TaskEvent::TaskUncompleted(task) => task.id,
            TaskEvent::TaskDeleted { id } => *id,
        }
    }
}

/// Fire-and-forget sink for task events. Publishing never fails the caller.
pub trait Notifier: Send + Sync {
    fn publish(&self, event: TaskEvent);
}

/// Fans events out to any number of in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<TaskEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: TaskEvent) {
        // Err only means nobody is listening
        if self.sender.send(event).is_err() {
            tracing::trace!("task event dropped, no subscribers");
        }
    }
}

/// Writes every event to the tracing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn publish(&self, event: TaskEvent) {
        tracing::info!(event = event.name(), task_id = %event.task_id(), "task event");
    }
}
