//! The task scheduler.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use lumen_core::backend::GenerationBackend;
use lumen_core::error::CoreError;
use lumen_core::provider_config::ConfigProvider;
use lumen_core::records::{RecordStore, StoreError};
use lumen_core::task::{SubmitTask, Task, TaskSnapshot, TaskTransition};
use lumen_core::task_events::TaskEvent;
use lumen_core::task_store::TaskStore;
use lumen_core::types::{DbId, TaskId};
use lumen_events::{SubscriberId, Subscription, TaskBroadcaster};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::config::{validate_max_concurrent, SchedulerConfig};
use crate::execution::{ExecutionError, Executor};

/// Everything guarded by the scheduler lock.
struct SchedulerState {
    tasks: TaskStore,
    /// Queued task ids, oldest first.
    queue: VecDeque<TaskId>,
    running: usize,
    max_concurrent: usize,
    next_seq: u64,
    accepting: bool,
}

struct Inner {
    state: Mutex<SchedulerState>,
    executor: Executor,
    broadcaster: Arc<TaskBroadcaster>,
    tracker: TaskTracker,
    snapshot_limit: usize,
}

/// Admits, runs, and reports generation tasks.
///
/// Cheap to clone; all clones share one scheduler.
#[derive(Clone)]
pub struct TaskScheduler {
    inner: Arc<Inner>,
}

impl TaskScheduler {
    pub fn new(
        config: SchedulerConfig,
        backend: Arc<dyn GenerationBackend>,
        records: Arc<dyn RecordStore>,
        configs: Arc<dyn ConfigProvider>,
        broadcaster: Arc<TaskBroadcaster>,
    ) -> Result<Self, CoreError> {
        let max_concurrent = validate_max_concurrent(config.max_concurrent)?;
        tracing::info!(
            max_concurrent,
            task_history_limit = config.task_history_limit,
            snapshot_limit = config.snapshot_limit,
            "Task scheduler created",
        );
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SchedulerState {
                    tasks: TaskStore::new(config.task_history_limit),
                    queue: VecDeque::new(),
                    running: 0,
                    max_concurrent,
                    next_seq: 0,
                    accepting: true,
                }),
                executor: Executor {
                    backend,
                    records,
                    configs,
                },
                broadcaster,
                tracker: TaskTracker::new(),
                snapshot_limit: config.snapshot_limit,
            }),
        })
    }

    // ---- admission ----

    /// Validate and enqueue a task. Returns the `queued` snapshot without
    /// waiting for a slot.
    ///
    /// Rejected requests create no task and emit no event.
    pub async fn submit(&self, request: SubmitTask) -> Result<TaskSnapshot, CoreError> {
        request.validate()?;
        self.inner
            .executor
            .configs
            .resolve(&request.config_name)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => CoreError::Validation(format!(
                    "Unknown config '{}'",
                    request.config_name
                )),
                other => other.into(),
            })?;

        let mut state = self.inner.state.lock().await;
        if !state.accepting {
            return Err(CoreError::Conflict(
                "Scheduler is shutting down; not accepting tasks".to_string(),
            ));
        }

        let task = Task::new(request);
        let task_id = task.id();
        let snapshot = state.tasks.insert(task)?;
        state.queue.push_back(task_id);
        tracing::info!(
            task_id = %task_id,
            kind = snapshot.kind.as_str(),
            count = snapshot.count,
            config = %snapshot.config_name,
            queued = state.queue.len(),
            "Task queued",
        );

        self.emit(&mut state, snapshot.clone()).await;
        self.promote(&mut state).await;
        Ok(snapshot)
    }

    // ---- queries ----

    pub async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, CoreError> {
        self.inner.state.lock().await.tasks.get(id)
    }

    /// Up to `limit` tasks, most recently created first.
    pub async fn list_tasks(&self, limit: usize) -> Vec<TaskSnapshot> {
        self.inner.state.lock().await.tasks.list_recent(limit)
    }

    pub async fn max_concurrent(&self) -> usize {
        self.inner.state.lock().await.max_concurrent
    }

    pub async fn running_count(&self) -> usize {
        self.inner.state.lock().await.running
    }

    pub async fn queued_count(&self) -> usize {
        self.inner.state.lock().await.queue.len()
    }

    // ---- subscriptions ----

    /// Subscribe to task events.
    ///
    /// The snapshot is taken and the subscriber registered under the
    /// scheduler lock, so every later transition is delivered exactly once
    /// and nothing already in the snapshot is replayed.
    pub async fn subscribe(&self) -> Subscription {
        let state = self.inner.state.lock().await;
        let snapshot = state.tasks.list_recent(self.inner.snapshot_limit);
        self.inner.broadcaster.subscribe(snapshot).await
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.inner.broadcaster.unsubscribe(id).await
    }

    // ---- budget ----

    /// Change the concurrency budget. Raising it promotes queued tasks
    /// immediately; lowering it never interrupts running tasks.
    pub async fn set_max_concurrent(&self, value: usize) -> Result<usize, CoreError> {
        let value = validate_max_concurrent(value)?;
        let mut state = self.inner.state.lock().await;
        let previous = std::mem::replace(&mut state.max_concurrent, value);
        tracing::info!(previous, max_concurrent = value, running = state.running, "Concurrency budget changed");
        if value > previous {
            self.promote(&mut state).await;
        }
        Ok(value)
    }

    // ---- shutdown ----

    /// Stop admitting and promoting tasks, then wait up to `timeout` for
    /// running tasks to finish. Returns `true` if they all did.
    ///
    /// Tasks still queued stay queued; they are not persisted.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        {
            let mut state = self.inner.state.lock().await;
            state.accepting = false;
            tracing::info!(
                running = state.running,
                queued = state.queue.len(),
                "Task scheduler shutting down",
            );
        }

        self.inner.tracker.close();
        let drained = tokio::time::timeout(timeout, self.inner.tracker.wait())
            .await
            .is_ok();
        if drained {
            tracing::info!("All running tasks finished");
        } else {
            tracing::warn!(timeout_secs = timeout.as_secs(), "Shutdown timed out with tasks still running");
        }

        self.inner.broadcaster.close_all().await;
        drained
    }

    // ---- internals (all called with the state lock held) ----

    async fn emit(&self, state: &mut MutexGuard<'_, SchedulerState>, snapshot: TaskSnapshot) {
        state.next_seq += 1;
        let event = TaskEvent::new(state.next_seq, snapshot);
        let delivered = self.inner.broadcaster.emit(event).await;
        tracing::trace!(seq = state.next_seq, delivered, "Task event emitted");
    }

    /// Start queued tasks, oldest first, until the budget is used up.
    async fn promote(&self, state: &mut MutexGuard<'_, SchedulerState>) {
        while state.accepting && state.running < state.max_concurrent {
            let Some(task_id) = state.queue.pop_front() else {
                break;
            };
            let snapshot = match state.tasks.update(task_id, TaskTransition::Start) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::error!(task_id = %task_id, error = %e, "Failed to start queued task");
                    continue;
                }
            };
            let Some(request) = state.tasks.task(task_id).map(|t| t.request().clone()) else {
                continue;
            };

            state.running += 1;
            tracing::info!(
                task_id = %task_id,
                running = state.running,
                max_concurrent = state.max_concurrent,
                "Task started",
            );
            self.emit(state, snapshot).await;
            self.inner.tracker.spawn(self.execute(task_id, request));
        }
    }

    /// The spawned body of one running task.
    fn execute(&self, task_id: TaskId, request: SubmitTask) -> BoxFuture<'static, ()> {
        let scheduler = self.clone();
        let span = tracing::info_span!("task", task_id = %task_id, kind = request.kind.as_str());
        async move {
            let outcome = AssertUnwindSafe(scheduler.inner.executor.run(task_id, &request))
                .catch_unwind()
                .await
                .unwrap_or(Err(ExecutionError::Panicked));
            scheduler.finish(task_id, outcome).await;
        }
        .instrument(span)
        .boxed()
    }

    async fn finish(&self, task_id: TaskId, outcome: Result<Vec<DbId>, ExecutionError>) {
        let transition = match outcome {
            Ok(record_ids) => {
                tracing::info!(results = record_ids.len(), "Task succeeded");
                TaskTransition::Succeed(record_ids)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Task failed");
                TaskTransition::Fail(e.to_string())
            }
        };

        let mut state = self.inner.state.lock().await;
        state.running = state.running.saturating_sub(1);
        match state.tasks.update(task_id, transition) {
            Ok(snapshot) => self.emit(&mut state, snapshot).await,
            Err(e) => tracing::error!(error = %e, "Failed to record task outcome"),
        }
        self.promote(&mut state).await;
    }
}
