// In-process notifications that keep independently rendered views consistent
// after a mutation. Each event declares which queries it invalidates.

pub mod bus;
pub mod cache;

pub use bus::{EventBus, Subscription};
pub use cache::ViewCache;

use serde::Serialize;
use uuid::Uuid;

use crate::model::{ObjectKind, ObjectNode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ObjectEvent {
    Created {
        node: ObjectNode,
    },
    Updated {
        node: ObjectNode,
    },
    Deleted {
        id: Uuid,
        /// Every removed id, the deleted node first, then its descendants
        removed: Vec<Uuid>,
    },
    ParentChanged {
        id: Uuid,
        old_parent: Option<Uuid>,
        new_parent: Option<Uuid>,
    },
}

/// Read queries a consumer may have cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "query", content = "key", rename_all = "snake_case")]
pub enum QueryKey {
    Page,
    All,
    ByKind(ObjectKind),
    Node(Uuid),
}

impl ObjectEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectEvent::Created { .. } => "object_created",
            ObjectEvent::Updated { .. } => "object_updated",
            ObjectEvent::Deleted { .. } => "object_deleted",
            ObjectEvent::ParentChanged { .. } => "parent_changed",
        }
    }

    /// Id of the node the event is about
    pub fn subject(&self) -> Uuid {
        match self {
            ObjectEvent::Created { node } | ObjectEvent::Updated { node } => node.id,
            ObjectEvent::Deleted { id, .. } | ObjectEvent::ParentChanged { id, .. } => *id,
        }
    }

    /// Queries whose cached results are stale once this event has fired
    pub fn invalidates(&self) -> Vec<QueryKey> {
        let mut keys = vec![QueryKey::Page, QueryKey::All];
        match self {
            ObjectEvent::Created { node } => {
                keys.push(QueryKey::ByKind(node.kind));
            }
            ObjectEvent::Updated { node } => {
                // The previous type is unknown here, so every type listing goes
                keys.extend(ObjectKind::ALL.iter().copied().map(QueryKey::ByKind));
                keys.push(QueryKey::Node(node.id));
            }
            ObjectEvent::Deleted { removed, .. } => {
                keys.extend(ObjectKind::ALL.iter().copied().map(QueryKey::ByKind));
                keys.extend(removed.iter().copied().map(QueryKey::Node));
            }
            ObjectEvent::ParentChanged { id, .. } => {
                keys.push(QueryKey::Node(*id));
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateObjectInput;
    use chrono::Utc;

    #[test]
    fn created_invalidates_only_its_type_listing() {
        let node = ObjectNode::from_input(CreateObjectInput::new("Room 4", ObjectKind::Room, 2), Utc::now());
        let keys = ObjectEvent::Created { node }.invalidates();

        assert!(keys.contains(&QueryKey::All));
        assert!(keys.contains(&QueryKey::Page));
        assert!(keys.contains(&QueryKey::ByKind(ObjectKind::Room)));
        assert!(!keys.contains(&QueryKey::ByKind(ObjectKind::Bed)));
    }

    #[test]
    fn deleted_invalidates_every_removed_node() {
        let removed = vec![Uuid::new_v4(), Uuid::new_v4()];
        let keys = ObjectEvent::Deleted { id: removed[0], removed: removed.clone() }.invalidates();

        for id in removed {
            assert!(keys.contains(&QueryKey::Node(id)));
        }
    }

    #[test]
    fn serializes_with_event_tag() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(ObjectEvent::ParentChanged { id, old_parent: None, new_parent: None }).unwrap();
        assert_eq!(value["event"], "parent_changed");
        assert_eq!(value["id"], id.to_string());
    }
}
