use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid page: {0} (pages start at 1)")]
    InvalidPage(u32),

    #[error("Invalid page size: {0} (must be positive)")]
    InvalidPageSize(u32),

    #[error("Hierarchy is {depth} levels deep, nested output is limited to {limit} levels")]
    TooDeep { depth: usize, limit: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Request field a parameter error refers to
    pub fn field(&self) -> Option<&'static str> {
        match self {
            QueryError::InvalidPage(_) => Some("page"),
            QueryError::InvalidPageSize(_) => Some("page_size"),
            QueryError::TooDeep { .. } | QueryError::Store(_) => None,
        }
    }
}
