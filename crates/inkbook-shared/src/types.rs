//! Common types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_APPOINTMENT_PAGE_SIZE, MAX_PAGE_SIZE};

pub type EntityId = Uuid;

pub fn new_id() -> EntityId {
    Uuid::new_v4()
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Builds a page request, falling back to page 1 and `default_limit`
    /// and clamping the limit to `MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(default_limit)
            .min(MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_APPOINTMENT_PAGE_SIZE)
    }
}

/// Paginated result envelope shared by every list operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            data,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: total_pages(total, pagination.limit),
        }
    }

    /// Offset-based variant: the page number is `floor(offset / limit) + 1`.
    pub fn from_offset(data: Vec<T>, total: u64, offset: u64, limit: u32) -> Self {
        let limit = limit.max(1);
        Self {
            data,
            total,
            page: u32::try_from(offset / limit as u64)
                .unwrap_or(u32::MAX)
                .saturating_add(1),
            limit,
            total_pages: total_pages(total, limit),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(limit as u64)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::new(None, None, 10);
        assert_eq!(p, Pagination { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(Some(0), Some(500), 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, MAX_PAGE_SIZE);

        let p = Pagination::new(Some(3), Some(20), 10);
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Paginated::new(vec![1, 2, 3], 21, Pagination::new(Some(1), Some(10), 10));
        assert_eq!(page.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], 0, Pagination::new(None, None, 10));
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_page_from_offset() {
        let page: Paginated<u8> = Paginated::from_offset(vec![], 120, 100, 50);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_page_from_huge_offset_saturates() {
        let page: Paginated<u8> = Paginated::from_offset(vec![], 3, u64::MAX, 50);
        assert_eq!(page.page, u32::MAX);
        assert_eq!(page.total_pages, 1);

        let page: Paginated<u8> = Paginated::from_offset(vec![], 0, u64::from(u32::MAX) * 50, 50);
        assert_eq!(page.page, u32::MAX);
    }
}
