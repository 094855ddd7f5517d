//! Pagination of list endpoints (50 items per page)

use serde::Serialize;

/// Page size constant for all pagination
pub const PAGE_SIZE: i64 = 50;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Index of the first item on the page
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// The page is clamped to `[1, total_pages]`.
///
/// # Examples
/// ```
/// use dccn_chair::pagination::calculate_pagination;
///
/// // 120 results = 3 pages (50 + 50 + 20)
/// let p = calculate_pagination(120, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 50);
///
/// let p = calculate_pagination(120, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 100);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64) -> Pagination {
    let total_pages = (total_results + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}

/// One page of a list response
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Cut the requested page out of the full, already ordered list
    pub fn from_items(items: Vec<T>, requested_page: i64) -> Self {
        let total = items.len() as i64;
        let p = calculate_pagination(total, requested_page);
        let items = items
            .into_iter()
            .skip(p.offset as usize)
            .take(PAGE_SIZE as usize)
            .collect();
        Page {
            page: p.page,
            page_size: PAGE_SIZE,
            total_pages: p.total_pages,
            total,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(120, 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 50);
    }

    #[test]
    fn test_pagination_out_of_bounds() {
        let p = calculate_pagination(75, 99);
        assert_eq!(p.page, 2); // Clamped to last page
        assert_eq!(p.offset, 50);

        let p = calculate_pagination(75, 0);
        assert_eq!(p.page, 1); // Clamped to first page
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(100, 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 50);
    }

    #[test]
    fn test_page_from_items() {
        let page = Page::from_items((1..=60).collect::<Vec<i64>>(), 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.total, 60);
        assert_eq!(page.items, (51..=60).collect::<Vec<i64>>());

        let empty: Page<i64> = Page::from_items(vec![], 3);
        assert_eq!(empty.page, 1);
        assert!(empty.items.is_empty());
    }
}
