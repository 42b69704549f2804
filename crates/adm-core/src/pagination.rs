//! Pagination types for list endpoints

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Largest page whose offset still fits in an i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Pagination parameters (from query string)
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }.normalized()
    }

    /// Clamp to 1 <= page <= MAX_PAGE and 1 <= page_size <= MAX_PAGE_SIZE
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.clamp(1, MAX_PAGE),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Calculate the SQL offset
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Calculate the SQL limit
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// One page of a collection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn new(list: Vec<T>, total: i64, params: PaginationParams) -> Self {
        Self {
            list,
            total,
            page: params.page,
            page_size: params.page_size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            list: self.list.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = PaginationParams::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let p = PaginationParams::new(3, 10);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_normalization() {
        let p = PaginationParams::new(0, 0);
        assert_eq!(p, PaginationParams { page: 1, page_size: 1 });

        let p = PaginationParams::new(-4, 5000);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let p = PaginationParams::new(i64::MAX, MAX_PAGE_SIZE);
        assert_eq!(p.page, MAX_PAGE);
        assert!(p.offset() > 0);

        let raw = PaginationParams {
            page: i64::MAX,
            page_size: 10,
        };
        assert_eq!(raw.offset(), i64::MAX);
    }

    #[test]
    fn test_page_serializes_page_size_in_camel_case() {
        let page = Page::new(vec![1, 2], 12, PaginationParams::new(2, 2));
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 2);
        assert_eq!(json["total"], 12);
        assert_eq!(json["list"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_map() {
        let page = Page::new(vec![1, 2, 3], 3, PaginationParams::default()).map(|n| n * 10);
        assert_eq!(page.list, vec![10, 20, 30]);
        assert_eq!(page.total, 3);
    }
}
