//! Task lifecycle events.
//!
//! The scheduler emits one [`TaskEvent`] per status transition, including
//! creation. Each event carries a full [`TaskSnapshot`], never a diff.

use serde::{Deserialize, Serialize};

use crate::task::{TaskSnapshot, TaskStatus};

/// Which transition produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    /// Task accepted and waiting for a slot.
    TaskQueued,
    /// Task occupied a slot and its backend call began.
    TaskStarted,
    /// Task finished with persisted results.
    TaskSucceeded,
    /// Task finished with an error.
    TaskFailed,
}

impl TaskEventKind {
    /// The event announcing that a task entered `status`.
    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Queued => TaskEventKind::TaskQueued,
            TaskStatus::Running => TaskEventKind::TaskStarted,
            TaskStatus::Succeeded => TaskEventKind::TaskSucceeded,
            TaskStatus::Failed => TaskEventKind::TaskFailed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskEventKind::TaskQueued => "task_queued",
            TaskEventKind::TaskStarted => "task_started",
            TaskEventKind::TaskSucceeded => "task_succeeded",
            TaskEventKind::TaskFailed => "task_failed",
        }
    }
}

/// A lifecycle event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Emission sequence number, strictly increasing per scheduler.
    pub seq: u64,
    pub event: TaskEventKind,
    pub task: TaskSnapshot,
}

impl TaskEvent {
    pub fn new(seq: u64, task: TaskSnapshot) -> Self {
        Self {
            seq,
            event: TaskEventKind::for_status(task.status),
            task,
        }
    }
}
