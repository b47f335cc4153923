//! Pagination arithmetic and paged result types.
//!
//! This module provides the [`Limit`] directive that drives skip/limit for listing
//! queries, the [`Pagination`] snapshot returned after a paginated listing, and the
//! [`Page`] container used by typed listings.

use serde::{Deserialize, Serialize};

/// Page size used when neither the caller nor the configuration provides one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// The page/size pair used to compute skip and limit for a listing query.
///
/// Pages are 1-indexed; page 0 is treated as page 1. A size of 0 falls back to the
/// builder's configured page size.
///
/// # Example
///
/// ```ignore
/// use bom_core::page::Limit;
///
/// let window = Limit::new(3, 20).window(50);
/// assert_eq!(window.limit, 20);
/// assert_eq!(window.offset, 40);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// The page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub size: u32,
}

impl Limit {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Computes the skip/limit window for this page.
    ///
    /// # Arguments
    ///
    /// * `fallback_size` - The size to use when `self.size` is 0
    pub fn window(&self, fallback_size: u32) -> Window {
        let limit = if self.size > 0 { self.size } else { fallback_size };
        let page = self.page.max(1);

        Window {
            limit,
            offset: u64::from(page - 1) * u64::from(limit),
        }
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self { page: 1, size: DEFAULT_PAGE_SIZE }
    }
}

/// The skip/limit pair applied to a find operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Maximum number of documents to return.
    pub limit: u32,
    /// Number of documents to skip.
    pub offset: u64,
}

/// Snapshot of the pagination state after a paginated listing.
///
/// `total_count` and `total_pages` are derived from the count operation issued alongside
/// the listing; `current_page` and `size` reflect the limit that was applied.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of documents matching the filter.
    pub total_count: u64,
    /// Number of pages of `size` documents needed to hold `total_count`.
    pub total_pages: u64,
    /// The page that was listed (1-indexed).
    pub current_page: u32,
    /// Number of items per page.
    pub size: u32,
}

impl Pagination {
    /// Creates an empty snapshot for pages of `size` items.
    pub fn new(size: u32) -> Self {
        Self {
            total_count: 0,
            total_pages: 0,
            current_page: 1,
            size,
        }
    }

    /// Records a new total count and the page/size that produced it.
    ///
    /// A page or size of 0 leaves the previous value in place. `total_pages` is always
    /// recomputed from the resulting size.
    pub fn update(&mut self, total_count: u64, page: u32, size: u32) -> Self {
        self.total_count = total_count;
        if page > 0 {
            self.current_page = page;
        }
        if size > 0 {
            self.size = size;
        }
        self.total_pages = total_pages(total_count, self.size);

        *self
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Returns `ceil(total_count / size)`, or 0 when `size` is 0.
pub fn total_pages(total_count: u64, size: u32) -> u64 {
    match size {
        0 => 0,
        size => total_count.div_ceil(u64::from(size)),
    }
}

/// A single page of decoded results.
///
/// # Type Parameters
///
/// * `T` - The type of items contained in this page
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Pagination snapshot for the listing that produced this page.
    pub pagination: Pagination,
    /// The next page number (if more pages exist).
    pub next_page: Option<u32>,
    /// The previous page number (if this is not the first page).
    pub previous_page: Option<u32>,
}

impl<T> Page<T> {
    /// Wraps `items` and derives navigation from `pagination`.
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        let current = pagination.current_page;

        Self {
            items,
            pagination,
            next_page: if u64::from(current) < pagination.total_pages {
                Some(current + 1)
            } else {
                None
            },
            previous_page: if current > 1 { Some(current - 1) } else { None },
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::default(),
            next_page: None,
            previous_page: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_exact_product() {
        for page in 1..=50u32 {
            for size in [1u32, 7, 20, 100] {
                let window = Limit::new(page, size).window(DEFAULT_PAGE_SIZE);
                assert_eq!(window.limit, size);
                assert_eq!(window.offset, u64::from(page - 1) * u64::from(size));
            }
        }
    }

    #[test]
    fn test_page_zero_is_page_one() {
        assert_eq!(Limit::new(0, 10).window(20), Limit::new(1, 10).window(20));
        assert_eq!(Limit::new(0, 10).window(20).offset, 0);
    }

    #[test]
    fn test_zero_size_falls_back() {
        let window = Limit::new(2, 0).window(25);
        assert_eq!(window.limit, 25);
        assert_eq!(window.offset, 25);
    }

    #[test]
    fn test_offset_does_not_overflow_u32() {
        let window = Limit::new(u32::MAX, u32::MAX).window(1);
        assert_eq!(window.offset, u64::from(u32::MAX - 1) * u64::from(u32::MAX));
    }

    #[test]
    fn test_total_pages_boundaries() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn test_pagination_update_keeps_previous_values_for_zero() {
        let mut pagination = Pagination::new(20);

        let snapshot = pagination.update(45, 0, 0);
        assert_eq!(
            snapshot,
            Pagination { total_count: 45, total_pages: 3, current_page: 1, size: 20 }
        );

        let snapshot = pagination.update(45, 2, 10);
        assert_eq!(
            snapshot,
            Pagination { total_count: 45, total_pages: 5, current_page: 2, size: 10 }
        );
    }

    #[test]
    fn test_page_navigation() {
        let middle = Page::new(vec![1, 2], Pagination { total_count: 6, total_pages: 3, current_page: 2, size: 2 });
        assert_eq!(middle.next_page, Some(3));
        assert_eq!(middle.previous_page, Some(1));

        let last = Page::new(vec![5, 6], Pagination { total_count: 6, total_pages: 3, current_page: 3, size: 2 });
        assert_eq!(last.next_page, None);
        assert_eq!(last.previous_page, Some(2));

        let empty: Page<i32> = Page::new(vec![], Pagination::new(2));
        assert_eq!(empty.next_page, None);
        assert_eq!(empty.previous_page, None);
    }
}
