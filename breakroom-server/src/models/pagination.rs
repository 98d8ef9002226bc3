//! Pagination types

use serde::{Deserialize, Serialize};

/// Maximum items per page
const MAX_LIMIT: u32 = 100;

/// Default items per page
const DEFAULT_LIMIT: u32 = 20;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page (max 100)
    pub limit: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// - Page is clamped to minimum of 1
    /// - Limit is clamped to 1..=100
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Query parameters for pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            params.page.unwrap_or(1),
            params.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}

/// `pagination` block of list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl PageInfo {
    pub fn new(pagination: Pagination, total: i64) -> Self {
        let limit = pagination.limit as i64;
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            pages: (total.max(0) + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 10).offset(), 10);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn clamps_page_and_limit() {
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::new(1, 0).limit, 1);
        assert_eq!(Pagination::new(1, 999).limit, 100);
    }

    #[test]
    fn defaults_from_empty_params() {
        let p = Pagination::from(PaginationParams::default());
        assert_eq!(p, Pagination { page: 1, limit: 20 });
    }

    #[test]
    fn page_count() {
        assert_eq!(PageInfo::new(Pagination::new(1, 10), 0).pages, 0);
        assert_eq!(PageInfo::new(Pagination::new(1, 10), 25).pages, 3);
        assert_eq!(PageInfo::new(Pagination::new(1, 10), 100).pages, 10);
    }
}
