// Read side of the object hierarchy: paginated, full and by-type listings
// plus the forest projection used by the tree and graph views.

pub mod error;
pub mod forest;
pub mod pagination;

pub use error::QueryError;
pub use forest::{build_forest, ensure_nestable, subtree_ids, TreeNode, MAX_NESTED_DEPTH};
pub use pagination::{page_count, Page, Pagination};

use std::sync::Arc;

use uuid::Uuid;

use crate::model::{ObjectKind, ObjectNode};
use crate::store::ObjectStore;

/// Unsynchronized reads against the object store
#[derive(Clone)]
pub struct ObjectQueries {
    store: Arc<dyn ObjectStore>,
    default_page_size: u32,
    max_page_size: u32,
}

impl ObjectQueries {
    pub fn new(store: Arc<dyn ObjectStore>, default_page_size: u32, max_page_size: u32) -> Self {
        Self {
            store,
            default_page_size: default_page_size.max(1),
            max_page_size: max_page_size.max(1),
        }
    }

    /// Resolve optional request parameters into a validated, capped page request
    pub fn pagination(&self, page: Option<u32>, page_size: Option<u32>) -> Result<Pagination, QueryError> {
        let pagination = Pagination::new(
            page.unwrap_or(1),
            page_size.unwrap_or(self.default_page_size),
        )?;
        Ok(pagination.clamp(self.max_page_size))
    }

    pub async fn list_page(&self, pagination: Pagination) -> Result<Page<ObjectNode>, QueryError> {
        let pagination = pagination.clamp(self.max_page_size);
        let (items, total) = self.store.list_page(pagination).await?;
        tracing::debug!(
            "Listed page {} (size {}): {} of {} objects",
            pagination.page,
            pagination.page_size,
            items.len(),
            total
        );
        Ok(Page::new(items, total, pagination))
    }

    pub async fn list_all(&self) -> Result<Vec<ObjectNode>, QueryError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn list_by_kind(&self, kind: ObjectKind) -> Result<Vec<ObjectNode>, QueryError> {
        Ok(self.store.list_by_kind(kind).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ObjectNode>, QueryError> {
        Ok(self.store.get_by_id(id).await?)
    }

    pub async fn forest(&self) -> Result<Vec<TreeNode>, QueryError> {
        let nodes = self.list_all().await?;
        Ok(build_forest(&nodes))
    }
}
