use serde::{Deserialize, Serialize};

use crate::query::error::QueryError;

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Result<Self, QueryError> {
        if page == 0 {
            return Err(QueryError::InvalidPage(page));
        }
        if page_size == 0 {
            return Err(QueryError::InvalidPageSize(page_size));
        }
        Ok(Self { page, page_size })
    }

    /// Cap the page size at the configured maximum
    pub fn clamp(self, max_page_size: u32) -> Self {
        Self {
            page: self.page,
            page_size: self.page_size.min(max_page_size.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// Number of pages needed to show `total` rows
pub fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

/// One page of results plus the total unfiltered row count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            page_count: page_count(total, pagination.page_size),
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            page_size: self.page_size,
        }
    }
}
