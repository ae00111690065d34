use async_trait::async_trait;
use std::time::Duration;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::types::Operation;

/// Observer rings with semantic meaning - synchronous (0-6) and asynchronous (7-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ObserverRing {
    DataPreparation = 0, // Load the target node and its parent chain
    InputValidation = 1, // Required fields, lengths, ranges
    Business = 3,        // Hierarchy rules
    Database = 5,        // Store execution
    Audit = 7,           // Change logging (async)
    Notification = 9,    // Event bus publication (async)
}

impl ObserverRing {
    pub const ALL: [ObserverRing; 6] = [
        ObserverRing::DataPreparation,
        ObserverRing::InputValidation,
        ObserverRing::Business,
        ObserverRing::Database,
        ObserverRing::Audit,
        ObserverRing::Notification,
    ];

    /// Check if ring executes synchronously (blocking)
    pub fn is_synchronous(&self) -> bool {
        (*self as u8) <= 6
    }
}

/// Base trait for all observers with metadata and applicability checks
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which ring this observer belongs to
    fn ring(&self) -> ObserverRing;

    /// Check if observer applies to this operation
    fn applies_to_operation(&self, op: Operation) -> bool;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }
}

/// Rings 0-6: may mutate the context and fail the mutation
#[async_trait]
pub trait SyncObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Rings 7-9: read-only, run after a successful write; failures become warnings
#[async_trait]
pub trait AsyncObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

pub enum ObserverBox {
    Sync(Box<dyn SyncObserver>),
    Async(Box<dyn AsyncObserver>),
}

impl ObserverBox {
    pub fn sync(observer: impl SyncObserver + 'static) -> Self {
        ObserverBox::Sync(Box::new(observer))
    }

    pub fn asynchronous(observer: impl AsyncObserver + 'static) -> Self {
        ObserverBox::Async(Box::new(observer))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObserverBox::Sync(o) => o.name(),
            ObserverBox::Async(o) => o.name(),
        }
    }

    pub fn ring(&self) -> ObserverRing {
        match self {
            ObserverBox::Sync(o) => o.ring(),
            ObserverBox::Async(o) => o.ring(),
        }
    }

    pub fn applies_to_operation(&self, op: Operation) -> bool {
        match self {
            ObserverBox::Sync(o) => o.applies_to_operation(op),
            ObserverBox::Async(o) => o.applies_to_operation(op),
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            ObserverBox::Sync(o) => o.timeout(),
            ObserverBox::Async(o) => o.timeout(),
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            ObserverBox::Sync(o) => o.priority(),
            ObserverBox::Async(o) => o.priority(),
        }
    }

    pub async fn execute_sync(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::Sync(o) => o.execute(ctx).await,
            ObserverBox::Async(_) => Ok(()), // Async observers don't execute in sync phase
        }
    }

    pub async fn execute_async(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::Async(o) => o.execute(ctx).await,
            ObserverBox::Sync(_) => Ok(()), // Sync observers don't execute in async phase
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_split_at_database() {
        assert!(ObserverRing::Business.is_synchronous());
        assert!(ObserverRing::Database.is_synchronous());
        assert!(!ObserverRing::Notification.is_synchronous());
    }
}
