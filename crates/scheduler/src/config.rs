use lumen_core::error::CoreError;
use lumen_core::task_store::DEFAULT_HISTORY_LIMIT;

/// Smallest accepted concurrency budget.
pub const MIN_CONCURRENT: usize = 1;
/// Largest accepted concurrency budget.
pub const MAX_CONCURRENT: usize = 10;
pub const DEFAULT_MAX_CONCURRENT: usize = 2;
/// Recent tasks handed to a new subscriber.
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 10;

/// Tuning knobs for [`TaskScheduler`](crate::TaskScheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub max_concurrent: usize,
    /// Terminal tasks kept in memory for listing.
    pub task_history_limit: usize,
    pub snapshot_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            task_history_limit: DEFAULT_HISTORY_LIMIT,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
        }
    }
}

/// Reject budgets outside `MIN_CONCURRENT..=MAX_CONCURRENT`.
pub fn validate_max_concurrent(value: usize) -> Result<usize, CoreError> {
    if (MIN_CONCURRENT..=MAX_CONCURRENT).contains(&value) {
        Ok(value)
    } else {
        Err(CoreError::Validation(format!(
            "max_concurrent must be between {MIN_CONCURRENT} and {MAX_CONCURRENT}, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(validate_max_concurrent(0).is_err());
        assert_eq!(validate_max_concurrent(1).unwrap(), 1);
        assert_eq!(validate_max_concurrent(10).unwrap(), 10);
        assert!(validate_max_concurrent(11).is_err());
    }

    #[test]
    fn defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.task_history_limit, 200);
        assert_eq!(config.snapshot_limit, 10);
    }
}
