//! Bounded-concurrency FIFO scheduler for generation tasks.
//!
//! [`TaskScheduler`] owns the task table, the admission queue, and the
//! concurrency budget behind one async mutex. Every state change happens in
//! that critical section and is broadcast while the lock is still held, so
//! subscribers observe transitions in exactly the order they happened.

pub mod config;
pub mod execution;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use execution::ExecutionError;
pub use scheduler::TaskScheduler;
