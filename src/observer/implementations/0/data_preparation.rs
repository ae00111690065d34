// Ring 0: Data Preparation - loads the target node and the parent it will hang under
use std::collections::HashSet;

use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct DataPreparationObserver;

impl Observer for DataPreparationObserver {
    fn name(&self) -> &'static str {
        "DataPreparationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::DataPreparation
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }
}

#[async_trait]
impl SyncObserver for DataPreparationObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if let Some(id) = ctx.target_id {
            let existing = ctx.store.get_by_id(id).await?.ok_or(ObserverError::NotFound(id))?;
            ctx.existing = Some(existing);
        }

        // Deletes only need the target; the store walks the subtree itself
        if ctx.operation == Operation::Delete {
            return Ok(());
        }

        if let Some(parent_id) = ctx.effective_parent_id() {
            let parent = ctx
                .store
                .get_by_id(parent_id)
                .await?
                .ok_or(ObserverError::ParentNotFound(parent_id))?;
            ctx.parent = Some(parent);
        }

        if ctx.parent_changed() {
            self.load_ancestors(ctx).await?;
        }

        Ok(())
    }
}

impl DataPreparationObserver {
    /// Walk up from the new parent so business rules can see the whole chain
    async fn load_ancestors(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let mut seen = HashSet::new();
        let mut cursor = ctx.parent.as_ref().and_then(|parent| parent.parent_id);

        while let Some(id) = cursor {
            if !seen.insert(id) {
                tracing::warn!("Parent chain above {:?} loops at {}", ctx.target_id, id);
                break;
            }
            match ctx.store.get_by_id(id).await? {
                Some(ancestor) => {
                    cursor = ancestor.parent_id;
                    ctx.ancestors.push(ancestor);
                }
                None => break,
            }
        }

        tracing::trace!(
            "Loaded {} ancestor(s) for reparent of {:?}",
            ctx.ancestors.len(),
            ctx.target_id
        );
        Ok(())
    }
}
