// Ring 7: Audit - structured change log
use async_trait::async_trait;

use crate::observer::context::{MutationOutcome, ObserverContext};
use crate::observer::error::ObserverError;
use crate::observer::traits::{AsyncObserver, Observer, ObserverRing};
use crate::types::Operation;

#[derive(Default)]
pub struct AuditLogObserver;

impl Observer for AuditLogObserver {
    fn name(&self) -> &'static str {
        "AuditLogObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Audit
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }
}

#[async_trait]
impl AsyncObserver for AuditLogObserver {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let elapsed_ms = ctx.execution_time().as_millis() as u64;
        match &ctx.outcome {
            Some(MutationOutcome::Created(node)) => {
                tracing::info!(target: "audit", operation = "create", id = %node.id, kind = %node.kind, parent = ?node.parent_id, elapsed_ms, "object created");
            }
            Some(MutationOutcome::Updated { before, after }) => {
                tracing::info!(
                    target: "audit",
                    operation = "update",
                    id = %after.id,
                    parent_before = ?before.parent_id,
                    parent_after = ?after.parent_id,
                    level_before = before.level,
                    level_after = after.level,
                    elapsed_ms,
                    "object updated"
                );
            }
            Some(MutationOutcome::Deleted { id, removed }) => {
                tracing::info!(target: "audit", operation = "delete", id = %id, removed = removed.len(), elapsed_ms, "object deleted");
            }
            None => {}
        }
        Ok(())
    }
}
