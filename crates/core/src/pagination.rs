//! Page request clamping and the paged result envelope.

use serde::Serialize;

/// Default page size for record listing.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Maximum page size for record listing.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`.
pub fn clamp_page_size(page_size: Option<i64>) -> i64 {
    page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Clamp a 1-based page number to at least 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.page_size - 1) / self.page_size
        }
    }
}
