//! Pagination types shared by every listing

use serde::{Deserialize, Serialize};

/// Fixed page size of the CRUD listings
pub const PAGE_SIZE: u32 = 5;

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Parse a raw `page` query value; anything that is not a positive number means page 1
    pub fn from_query(page: Option<&str>, per_page: u32) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Self::new(page, per_page)
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Total number of pages; an empty listing still has one page
    pub fn total_pages(&self) -> u32 {
        if self.total <= 0 {
            return 1;
        }
        let per_page = self.per_page.max(1) as i64;
        ((self.total + per_page - 1) / per_page) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether the requested page lies past the last page
    pub fn is_out_of_range(&self) -> bool {
        self.page > self.total_pages()
    }

    /// Summary used by the templates
    pub fn page_info(&self) -> PageInfo {
        let total_pages = self.total_pages();
        PageInfo {
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages,
            has_next: self.has_next(),
            has_prev: self.has_prev(),
            next_page: self.page + 1,
            prev_page: self.page.saturating_sub(1),
            is_paginated: total_pages > 1,
        }
    }

    /// Convert the items while keeping the pagination data
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Pagination metadata exposed to templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page: u32,
    pub prev_page: u32,
    pub is_paginated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_query_defaults_to_first_page() {
        assert_eq!(ListParams::from_query(None, 5).page, 1);
        assert_eq!(ListParams::from_query(Some("abc"), 5).page, 1);
        assert_eq!(ListParams::from_query(Some("0"), 5).page, 1);
        assert_eq!(ListParams::from_query(Some(" 3 "), 5).page, 3);
    }

    #[test]
    fn test_fifteen_items_make_three_pages() {
        let params = ListParams::new(1, PAGE_SIZE);
        let result = PagedResult::new(vec![0; 5], 15, &params);
        let info = result.page_info();

        assert_eq!(info.total_pages, 3);
        assert!(info.is_paginated);
        assert!(info.has_next);
        assert!(!info.has_prev);
        assert!(!result.is_out_of_range());
    }

    #[test]
    fn test_empty_listing_is_single_page() {
        let result: PagedResult<i32> = PagedResult::new(vec![], 0, &ListParams::default());

        assert_eq!(result.total_pages(), 1);
        assert!(!result.page_info().is_paginated);
        assert!(!result.is_out_of_range());
    }

    #[test]
    fn test_page_past_end_is_out_of_range() {
        let result: PagedResult<i32> = PagedResult::new(vec![], 6, &ListParams::new(3, 5));
        assert!(result.is_out_of_range());
    }

    proptest! {
        #[test]
        fn prop_pages_cover_all_items(total in 0i64..10_000, per_page in 1u32..=100) {
            let result: PagedResult<()> = PagedResult::new(vec![], total, &ListParams::new(1, per_page));
            let pages = result.total_pages() as i64;

            prop_assert!(pages >= 1);
            prop_assert!(pages * per_page as i64 >= total);
            prop_assert!((pages - 1) * (per_page as i64) < total.max(1));
        }

        #[test]
        fn prop_offset_matches_page(page in 1u32..10_000, per_page in 1u32..=100) {
            let params = ListParams::new(page, per_page);
            prop_assert_eq!(params.offset(), (page as i64 - 1) * per_page as i64);
        }
    }
}
