use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use crate::observer::ObserverError;
use crate::query::QueryError;
use crate::store::StoreError;
use crate::views::InteractionError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("Object not found: {0}")]
    NotFound(Uuid),

    #[error("Parent object not found: {0}")]
    ParentNotFound(Uuid),

    #[error("{0}")]
    BusinessRule(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = BTreeMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ServiceError::Validation { message, field_errors }
    }
}

impl From<ObserverError> for ServiceError {
    fn from(err: ObserverError) -> Self {
        match err {
            ObserverError::ValidationError { message, field_errors } => ServiceError::Validation { message, field_errors },
            ObserverError::NotFound(id) => ServiceError::NotFound(id),
            ObserverError::ParentNotFound(id) => ServiceError::ParentNotFound(id),
            ObserverError::BusinessRule(message) => ServiceError::BusinessRule(message),
            other @ (ObserverError::DatabaseError(_)
            | ObserverError::TimeoutError(_)
            | ObserverError::PipelineError(_)) => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            StoreError::ParentNotFound(id) => ServiceError::ParentNotFound(id),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Store(store) => store.into(),
            err @ QueryError::TooDeep { .. } => ServiceError::BusinessRule(err.to_string()),
            other => match other.field() {
                Some(field) => ServiceError::field(field, other.to_string()),
                None => ServiceError::Internal(other.to_string()),
            },
        }
    }
}

impl From<InteractionError> for ServiceError {
    fn from(err: InteractionError) -> Self {
        match err {
            InteractionError::UnknownNode(id) => ServiceError::NotFound(id),
            other @ InteractionError::NoSuchEdge { .. } => ServiceError::BusinessRule(other.to_string()),
        }
    }
}
