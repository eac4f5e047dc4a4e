//! In-memory task table.
//!
//! Insertion-ordered and bounded: once more than `history_limit` tasks are
//! terminal, the ones that finished first are evicted. Queued and running
//! tasks are never evicted. Every read returns an owned [`TaskSnapshot`].

use std::collections::{HashMap, VecDeque};

use crate::error::CoreError;
use crate::task::{Task, TaskSnapshot, TaskTransition};
use crate::types::TaskId;

/// Default number of finished tasks kept for listing.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

pub struct TaskStore {
    tasks: HashMap<TaskId, Task>,
    /// Creation order, oldest first.
    order: VecDeque<TaskId>,
    /// Terminal tasks in the order they finished, oldest first.
    finished: VecDeque<TaskId>,
    history_limit: usize,
}

impl TaskStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            tasks: HashMap::new(),
            order: VecDeque::new(),
            finished: VecDeque::new(),
            history_limit: history_limit.max(1),
        }
    }

    pub fn insert(&mut self, task: Task) -> Result<TaskSnapshot, CoreError> {
        let id = task.id();
        if self.tasks.contains_key(&id) {
            return Err(CoreError::Conflict(format!("Task {id} already exists")));
        }
        let snapshot = task.snapshot();
        self.order.push_back(id);
        self.tasks.insert(id, task);
        Ok(snapshot)
    }

    pub fn get(&self, id: TaskId) -> Result<TaskSnapshot, CoreError> {
        self.tasks
            .get(&id)
            .map(Task::snapshot)
            .ok_or_else(|| CoreError::not_found("Task", id))
    }

    /// Borrow the live record. Only the scheduler should need this.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Apply a transition and return the post-transition snapshot.
    pub fn update(
        &mut self,
        id: TaskId,
        transition: TaskTransition,
    ) -> Result<TaskSnapshot, CoreError> {
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("Task", id))?;
        task.apply(transition)?;
        let snapshot = task.snapshot();

        if snapshot.status.is_terminal() {
            self.finished.push_back(id);
            self.evict_finished();
        }
        Ok(snapshot)
    }

    /// Up to `limit` tasks, most recently created first.
    pub fn list_recent(&self, limit: usize) -> Vec<TaskSnapshot> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.tasks.get(id))
            .take(limit)
            .map(Task::snapshot)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn evict_finished(&mut self) {
        let mut evicted = false;
        while self.finished.len() > self.history_limit {
            if let Some(id) = self.finished.pop_front() {
                self.tasks.remove(&id);
                evicted = true;
            }
        }
        if evicted {
            let tasks = &self.tasks;
            self.order.retain(|id| tasks.contains_key(id));
        }
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
