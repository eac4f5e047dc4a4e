use lumen_core::task::TaskSnapshot;
use lumen_core::task_events::{TaskEvent, TaskEventKind};
use serde::Serialize;

/// A server-to-client message, sent as a JSON text frame.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once, first, on every connection.
    Snapshot { tasks: Vec<TaskSnapshot> },
    TaskUpdate {
        seq: u64,
        event: TaskEventKind,
        task: TaskSnapshot,
    },
}

impl From<TaskEvent> for ServerMessage {
    fn from(event: TaskEvent) -> Self {
        ServerMessage::TaskUpdate {
            seq: event.seq,
            event: event.event,
            task: event.task,
        }
    }
}
