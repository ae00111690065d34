use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Observer system errors with structured error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObserverError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("Object not found: {0}")]
    NotFound(Uuid),

    #[error("Parent object not found: {0}")]
    ParentNotFound(Uuid),

    #[error("{0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Pipeline execution failed: {0}")]
    PipelineError(String),
}

impl ObserverError {
    pub fn business(message: impl Into<String>) -> Self {
        ObserverError::BusinessRule(message.into())
    }
}

impl From<StoreError> for ObserverError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => ObserverError::NotFound(id),
            StoreError::ParentNotFound(id) => ObserverError::ParentNotFound(id),
            other => ObserverError::DatabaseError(other.to_string()),
        }
    }
}

/// Observer warnings (non-fatal issues)
#[derive(Debug, Clone)]
pub struct ObserverWarning {
    pub observer: String,
    pub ring: u8,
    pub message: String,
}

impl ObserverWarning {
    pub fn new(observer: &str, ring: u8, message: String) -> Self {
        Self {
            observer: observer.to_string(),
            ring,
            message,
        }
    }
}
