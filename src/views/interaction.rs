// Graph gestures and the commands they resolve to

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{ObjectKind, ObjectNode};

/// Type preselected in the creation dialog
pub const DEFAULT_DRAFT_KIND: ObjectKind = ObjectKind::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GraphInteraction {
    /// Node label clicked
    EditRequested { id: Uuid },
    AddChild { parent: Uuid },
    AddRoot,
    Delete { id: Uuid },
    /// Connection dragged from `source` to `target`: `target` moves under `source`
    Connect { source: Uuid, target: Uuid },
    /// Edge control clicked: the child becomes a root, nothing is deleted
    RemoveEdge { source: Uuid, target: Uuid },
}

/// Pre-filled creation form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDraft {
    pub parent_id: Option<Uuid>,
    pub level: i32,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
}

impl CreateDraft {
    pub fn root() -> Self {
        Self {
            parent_id: None,
            level: 0,
            kind: DEFAULT_DRAFT_KIND,
        }
    }

    pub fn child_of(parent: &ObjectNode) -> Self {
        Self {
            parent_id: Some(parent.id),
            level: parent.level.saturating_add(1),
            kind: DEFAULT_DRAFT_KIND,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphCommand {
    OpenEditor(ObjectNode),
    OpenCreate(CreateDraft),
    Delete(Uuid),
    Reparent { child: Uuid, parent: Uuid },
    Detach { child: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("Object not found: {0}")]
    UnknownNode(Uuid),

    #[error("No edge from {parent} to {child}")]
    NoSuchEdge { parent: Uuid, child: Uuid },
}

impl GraphInteraction {
    /// Resolve against the node set currently shown
    pub fn resolve(self, nodes: &[ObjectNode]) -> Result<GraphCommand, InteractionError> {
        let find = |id: Uuid| {
            nodes
                .iter()
                .find(|node| node.id == id)
                .ok_or(InteractionError::UnknownNode(id))
        };

        match self {
            GraphInteraction::EditRequested { id } => Ok(GraphCommand::OpenEditor(find(id)?.clone())),
            GraphInteraction::AddChild { parent } => Ok(GraphCommand::OpenCreate(CreateDraft::child_of(find(parent)?))),
            GraphInteraction::AddRoot => Ok(GraphCommand::OpenCreate(CreateDraft::root())),
            GraphInteraction::Delete { id } => Ok(GraphCommand::Delete(find(id)?.id)),
            GraphInteraction::Connect { source, target } => {
                find(source)?;
                find(target)?;
                Ok(GraphCommand::Reparent {
                    child: target,
                    parent: source,
                })
            }
            GraphInteraction::RemoveEdge { source, target } => {
                let child = find(target)?;
                if child.parent_id != Some(source) {
                    return Err(InteractionError::NoSuchEdge { parent: source, child: target });
                }
                Ok(GraphCommand::Detach { child: target })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateObjectInput;
    use chrono::Utc;

    fn nodes() -> (ObjectNode, ObjectNode) {
        let ward = ObjectNode::from_input(CreateObjectInput::new("Ward", ObjectKind::Unit, 1), Utc::now());
        let room = ObjectNode::from_input(
            CreateObjectInput::new("Room", ObjectKind::Room, 2).with_parent(ward.id),
            Utc::now(),
        );
        (ward, room)
    }

    #[test]
    fn add_child_seeds_parent_and_next_level() {
        let (ward, room) = nodes();
        let command = GraphInteraction::AddChild { parent: ward.id }
            .resolve(&[ward.clone(), room])
            .unwrap();

        assert_eq!(
            command,
            GraphCommand::OpenCreate(CreateDraft {
                parent_id: Some(ward.id),
                level: 2,
                kind: DEFAULT_DRAFT_KIND,
            })
        );
    }

    #[test]
    fn connect_moves_target_under_source() {
        let (ward, room) = nodes();
        let command = GraphInteraction::Connect { source: room.id, target: ward.id }
            .resolve(&[ward.clone(), room.clone()])
            .unwrap();

        assert_eq!(command, GraphCommand::Reparent { child: ward.id, parent: room.id });
    }

    #[test]
    fn remove_edge_requires_the_edge() {
        let (ward, room) = nodes();
        let set = [ward.clone(), room.clone()];

        assert_eq!(
            GraphInteraction::RemoveEdge { source: ward.id, target: room.id }.resolve(&set),
            Ok(GraphCommand::Detach { child: room.id })
        );
        assert_eq!(
            GraphInteraction::RemoveEdge { source: room.id, target: ward.id }.resolve(&set),
            Err(InteractionError::NoSuchEdge { parent: room.id, child: ward.id })
        );
    }

    #[test]
    fn unknown_node_is_reported() {
        let id = Uuid::new_v4();
        assert_eq!(
            GraphInteraction::Delete { id }.resolve(&[]),
            Err(InteractionError::UnknownNode(id))
        );
    }

    #[test]
    fn deserializes_from_tagged_json() {
        let id = Uuid::new_v4();
        let interaction: GraphInteraction =
            serde_json::from_value(serde_json::json!({ "action": "edit_requested", "id": id })).unwrap();
        assert_eq!(interaction, GraphInteraction::EditRequested { id });
    }
}
