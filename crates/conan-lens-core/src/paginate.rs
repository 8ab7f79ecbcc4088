//! Offset/limit slicing over an already sorted sequence.

use crate::error::{CatalogError, Result};

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(page: usize, per_page: usize) -> Result<Self> {
        if page < 1 {
            return Err(CatalogError::Validation("page must be at least 1".into()));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(CatalogError::Validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(Self { page, per_page })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// The window of `items` this page covers. Out-of-range pages are empty.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.per_page);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(self.per_page).min(items.len());
        &items[start..end]
    }

    pub fn paginate<T: Clone>(&self, items: &[T]) -> Page<T> {
        Page {
            items: self.slice(items).to_vec(),
            total: items.len(),
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// One page of results. `total` is the length before slicing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_bounds_requests() {
        assert!(Pagination::new(0, 20).is_err());
        assert!(Pagination::new(1, 0).is_err());
        assert!(Pagination::new(1, 101).is_err());
        assert!(Pagination::new(1, 100).is_ok());
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let items: Vec<u32> = (0..10).collect();
        let page = Pagination::new(5, 20).unwrap().paginate(&items);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 10);
        assert_eq!(page.page, 5);
    }

    #[test]
    fn last_page_is_clipped() {
        let items: Vec<u32> = (0..45).collect();
        let page = Pagination::new(3, 20).unwrap().paginate(&items);
        assert_eq!(page.items, (40..45).collect::<Vec<_>>());
    }

    #[test]
    fn pages_concatenate_back_to_the_input() {
        let items: Vec<u32> = (0..97).collect();
        for per_page in [1, 7, 20, 96, 97, 100] {
            let pages = items.len().div_ceil(per_page);
            let rebuilt: Vec<u32> = (1..=pages)
                .flat_map(|page| Pagination::new(page, per_page).unwrap().slice(&items).to_vec())
                .collect();
            assert_eq!(rebuilt, items, "per_page = {per_page}");
        }
    }

    #[test]
    fn default_is_first_page_of_twenty() {
        let pagination = Pagination::default();
        assert_eq!((pagination.page(), pagination.per_page()), (1, DEFAULT_PER_PAGE));
    }
}
