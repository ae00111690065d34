// Object hierarchy data model: organizations -> units -> rooms -> beds

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest description accepted by input validation
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Closed set of node types offered to callers for selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ObjectKind {
    Organization,
    Unit,
    Room,
    Bed,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Organization,
        ObjectKind::Unit,
        ObjectKind::Room,
        ObjectKind::Bed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Organization => "Organization",
            ObjectKind::Unit => "Unit",
            ObjectKind::Room => "Room",
            ObjectKind::Bed => "Bed",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown object type '{0}', expected one of Organization, Unit, Room, Bed")]
pub struct UnknownObjectKind(pub String);

impl FromStr for ObjectKind {
    type Err = UnknownObjectKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownObjectKind(s.to_string()))
    }
}

impl TryFrom<String> for ObjectKind {
    type Error = UnknownObjectKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A node of the organizational forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectNode {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    /// Opaque configuration blob, never interpreted here
    pub config: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ObjectNode {
    /// Build a fresh node from creation input, assigning a new id
    pub fn from_input(input: CreateObjectInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            kind: input.kind,
            parent_id: input.parent_id,
            level: input.level,
            config: input.config,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input accepted by the create operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateObjectInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub level: i32,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub config: Option<String>,
}

impl CreateObjectInput {
    pub fn new(name: impl Into<String>, kind: ObjectKind, level: i32) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            level,
            parent_id: None,
            config: None,
        }
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update. Absent fields are left untouched; for nullable fields an
/// explicit `null` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ObjectKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub config: Option<Option<String>>,
}

// Distinguishes `"field": null` (Some(None)) from a missing field (None)
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ObjectPatch {
    /// Patch produced by a drag-connect: only the parent changes
    pub fn reparent(parent_id: Uuid) -> Self {
        Self {
            parent_id: Some(Some(parent_id)),
            ..Default::default()
        }
    }

    /// Patch produced by removing an edge: the child becomes a root
    pub fn detach() -> Self {
        Self {
            parent_id: Some(None),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.kind.is_none()
            && self.level.is_none()
            && self.parent_id.is_none()
            && self.config.is_none()
    }

    /// New parent requested by this patch, if the patch assigns one
    pub fn assigned_parent(&self) -> Option<Uuid> {
        self.parent_id.flatten()
    }

    pub fn apply(&self, node: &mut ObjectNode, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(description) = &self.description {
            node.description = description.clone();
        }
        if let Some(kind) = self.kind {
            node.kind = kind;
        }
        if let Some(level) = self.level {
            node.level = level;
        }
        if let Some(parent_id) = self.parent_id {
            node.parent_id = parent_id;
        }
        if let Some(config) = &self.config {
            node.config = config.clone();
        }
        node.updated_at = now;
    }
}
