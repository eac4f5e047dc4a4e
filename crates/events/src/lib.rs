//! Lumen live task-event fan-out.
//!
//! - [`TaskBroadcaster`]: dynamic set of subscribers, each fed by its own
//!   unbounded channel so emission never blocks the scheduler.
//! - [`Subscription`]: initial task snapshot plus the live event receiver.

pub mod broadcaster;

pub use broadcaster::{SubscriberId, Subscription, TaskBroadcaster};
