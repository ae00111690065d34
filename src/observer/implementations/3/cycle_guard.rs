// Ring 3: Business - reparenting must keep the hierarchy a forest
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct CycleGuard;

impl Observer for CycleGuard {
    fn name(&self) -> &'static str {
        "CycleGuard"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Update
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl SyncObserver for CycleGuard {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if !ctx.parent_changed() {
            return Ok(());
        }
        let (Some(target), Some(parent)) = (ctx.target_id, ctx.parent.as_ref()) else {
            return Ok(());
        };

        if parent.id == target {
            return Err(ObserverError::business("An object cannot be its own parent"));
        }

        // Ancestors run from the new parent upward; finding the target means the
        // new parent is one of its descendants
        if ctx.ancestors.iter().any(|ancestor| ancestor.id == target) {
            return Err(ObserverError::business(format!(
                "Cannot move an object under its own descendant '{}'",
                parent.name
            )));
        }
        Ok(())
    }
}
