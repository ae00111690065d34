use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{ObjectKind, ObjectNode, ObjectPatch};
use crate::query::{subtree_ids, Pagination};
use crate::store::{ObjectStore, StoreError};

/// Process-local store, insertion ordered
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<IndexMap<Uuid, ObjectNode>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, node: ObjectNode) -> Result<ObjectNode, StoreError> {
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(&node.id) {
            return Err(StoreError::Duplicate(node.id));
        }
        if let Some(parent_id) = node.parent_id {
            if !nodes.contains_key(&parent_id) {
                return Err(StoreError::ParentNotFound(parent_id));
            }
        }
        nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn update(&self, id: Uuid, patch: ObjectPatch) -> Result<ObjectNode, StoreError> {
        let mut nodes = self.nodes.write().await;
        if let Some(parent_id) = patch.assigned_parent() {
            if !nodes.contains_key(&parent_id) {
                return Err(StoreError::ParentNotFound(parent_id));
            }
        }
        let node = nodes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply(node, Utc::now());
        Ok(node.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let mut nodes = self.nodes.write().await;
        if !nodes.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        let snapshot: Vec<ObjectNode> = nodes.values().cloned().collect();
        let removed = subtree_ids(&snapshot, id);
        for removed_id in &removed {
            nodes.shift_remove(removed_id);
        }
        Ok(removed)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ObjectNode>, StoreError> {
        Ok(self.nodes.read().await.get(&id).cloned())
    }

    async fn list_page(&self, pagination: Pagination) -> Result<(Vec<ObjectNode>, u64), StoreError> {
        let nodes = self.nodes.read().await;
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);
        let items = nodes.values().skip(offset).take(limit).cloned().collect();
        Ok((items, nodes.len() as u64))
    }

    async fn list_all(&self) -> Result<Vec<ObjectNode>, StoreError> {
        Ok(self.nodes.read().await.values().cloned().collect())
    }

    async fn list_by_kind(&self, kind: ObjectKind) -> Result<Vec<ObjectNode>, StoreError> {
        Ok(self
            .nodes
            .read()
            .await
            .values()
            .filter(|node| node.kind == kind)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
