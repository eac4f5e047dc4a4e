//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default number of tasks returned by `GET /tasks`.
pub const DEFAULT_TASK_LIMIT: usize = 10;
/// Upper bound on `GET /tasks?limit=`.
pub const MAX_TASK_LIMIT: usize = 100;

/// `?limit=` for recent-task listing.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

impl LimitParams {
    pub fn clamped(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_TASK_LIMIT)
            .clamp(1, MAX_TASK_LIMIT)
    }
}

/// `?page=&page_size=` for record listing. Clamped by the record store.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
