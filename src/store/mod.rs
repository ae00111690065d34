// Persistence contract for object nodes.
//
// The store exclusively owns persisted state. It enforces that a parent
// reference points at an existing node and that deleting a node removes all of
// its transitive descendants. Level and type rules live in the observer pipeline.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::model::{ObjectKind, ObjectNode, ObjectPatch};
use crate::query::Pagination;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(Uuid),

    #[error("Parent object not found: {0}")]
    ParentNotFound(Uuid),

    #[error("Object already exists: {0}")]
    Duplicate(Uuid),

    #[error("Corrupt object row: {0}")]
    Corrupt(String),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging and health output
    fn backend(&self) -> &'static str;

    async fn create(&self, node: ObjectNode) -> Result<ObjectNode, StoreError>;

    /// Apply a partial update, last write wins
    async fn update(&self, id: Uuid, patch: ObjectPatch) -> Result<ObjectNode, StoreError>;

    /// Delete a node and all of its descendants; returns the removed ids, root first
    async fn delete(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ObjectNode>, StoreError>;

    /// One page in creation order plus the total row count
    async fn list_page(&self, pagination: Pagination) -> Result<(Vec<ObjectNode>, u64), StoreError>;

    async fn list_all(&self) -> Result<Vec<ObjectNode>, StoreError>;

    async fn list_by_kind(&self, kind: ObjectKind) -> Result<Vec<ObjectNode>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Open the configured backend: Postgres when a database URL is set, memory otherwise
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    match config.url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, config).await?;
            if config.run_migrations {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, objects are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
