//! Pagination parameters shared by list operations.

use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: u32 = 50;
const MAX_PER_PAGE: u32 = 200;

/// Clamped pagination window (1-based page number).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    page: u32,
    per_page: u32,
}

impl Page {
    /// Build a page, clamping out-of-range values instead of rejecting them.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Row offset for SQL `OFFSET` / slice skipping.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unspecified() {
        let p = Page::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn clamps_zero_and_oversized_values() {
        let p = Page::new(Some(0), Some(10_000));
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn offset_advances_with_page() {
        let p = Page::new(Some(3), Some(25));
        assert_eq!(p.offset(), 50);
        assert_eq!(p.limit(), 25);
    }
}
