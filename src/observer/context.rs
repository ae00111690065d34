use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::model::{CreateObjectInput, ObjectNode, ObjectPatch};
use crate::observer::error::{ObserverError, ObserverWarning};
use crate::observer::traits::ObserverRing;
use crate::store::ObjectStore;
use crate::types::Operation;

/// What the Database ring produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Created(ObjectNode),
    Updated { before: ObjectNode, after: ObjectNode },
    Deleted { id: Uuid, removed: Vec<Uuid> },
}

/// State flowing through the observer rings for a single mutation
pub struct ObserverContext {
    // Core request data
    pub operation: Operation,
    pub store: Arc<dyn ObjectStore>,
    pub target_id: Option<Uuid>,
    pub create: Option<CreateObjectInput>,
    pub patch: Option<ObjectPatch>,

    // Loaded by ring 0
    pub existing: Option<ObjectNode>,
    /// Parent the node will have once the mutation is applied
    pub parent: Option<ObjectNode>,
    /// Ancestors of `parent`, nearest first; only loaded when the parent changes
    pub ancestors: Vec<ObjectNode>,

    // Populated by ring 5
    pub outcome: Option<MutationOutcome>,

    // Performance tracking
    pub start_time: Instant,
    pub current_ring: Option<ObserverRing>,

    // Error and warning accumulation
    pub errors: Vec<ObserverError>,
    pub warnings: Vec<ObserverWarning>,
}

impl ObserverContext {
    fn new(operation: Operation, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            operation,
            store,
            target_id: None,
            create: None,
            patch: None,
            existing: None,
            parent: None,
            ancestors: Vec::new(),
            outcome: None,
            start_time: Instant::now(),
            current_ring: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn for_create(store: Arc<dyn ObjectStore>, input: CreateObjectInput) -> Self {
        Self {
            create: Some(input),
            ..Self::new(Operation::Create, store)
        }
    }

    pub fn for_update(store: Arc<dyn ObjectStore>, id: Uuid, patch: ObjectPatch) -> Self {
        Self {
            target_id: Some(id),
            patch: Some(patch),
            ..Self::new(Operation::Update, store)
        }
    }

    pub fn for_delete(store: Arc<dyn ObjectStore>, id: Uuid) -> Self {
        Self {
            target_id: Some(id),
            ..Self::new(Operation::Delete, store)
        }
    }

    /// Parent id requested by the mutation, falling back to the stored one
    pub fn effective_parent_id(&self) -> Option<Uuid> {
        match self.operation {
            Operation::Create => self.create.as_ref().and_then(|input| input.parent_id),
            Operation::Update => match self.patch.as_ref().and_then(|patch| patch.parent_id) {
                Some(requested) => requested,
                None => self.existing.as_ref().and_then(|node| node.parent_id),
            },
            Operation::Delete => self.existing.as_ref().and_then(|node| node.parent_id),
        }
    }

    /// True when an update assigns a parent different from the stored one
    pub fn parent_changed(&self) -> bool {
        match (&self.patch, &self.existing) {
            (Some(patch), Some(existing)) => patch
                .parent_id
                .map(|requested| requested != existing.parent_id)
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Level the node will have once the mutation is applied
    pub fn effective_level(&self) -> Option<i32> {
        match self.operation {
            Operation::Create => self.create.as_ref().map(|input| input.level),
            Operation::Update => self
                .patch
                .as_ref()
                .and_then(|patch| patch.level)
                .or_else(|| self.existing.as_ref().map(|node| node.level)),
            Operation::Delete => None,
        }
    }

    pub fn add_warning(&mut self, warning: ObserverWarning) {
        self.warnings.push(warning);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn execution_time(&self) -> Duration {
        self.start_time.elapsed()
    }
}
