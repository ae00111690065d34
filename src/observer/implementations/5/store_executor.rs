// Ring 5: Database - applies the prepared mutation to the object store
use async_trait::async_trait;
use chrono::Utc;

use crate::model::ObjectNode;
use crate::observer::context::{MutationOutcome, ObserverContext};
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct StoreExecutor;

impl Observer for StoreExecutor {
    fn name(&self) -> &'static str {
        "StoreExecutor"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Database
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }
}

fn missing(what: &str) -> ObserverError {
    ObserverError::PipelineError(format!("{} missing from context", what))
}

#[async_trait]
impl SyncObserver for StoreExecutor {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let outcome = match ctx.operation {
            Operation::Create => {
                let input = ctx.create.clone().ok_or_else(|| missing("create input"))?;
                let created = ctx.store.create(ObjectNode::from_input(input, Utc::now())).await?;
                tracing::info!("Created {} '{}' ({})", created.kind, created.name, created.id);
                MutationOutcome::Created(created)
            }
            Operation::Update => {
                let id = ctx.target_id.ok_or_else(|| missing("target id"))?;
                let patch = ctx.patch.clone().ok_or_else(|| missing("patch"))?;
                let before = ctx.existing.clone().ok_or(ObserverError::NotFound(id))?;
                let after = ctx.store.update(id, patch).await?;
                tracing::info!("Updated {} '{}' ({})", after.kind, after.name, after.id);
                MutationOutcome::Updated { before, after }
            }
            Operation::Delete => {
                let id = ctx.target_id.ok_or_else(|| missing("target id"))?;
                let removed = ctx.store.delete(id).await?;
                tracing::info!("Deleted object {} and {} descendant(s)", id, removed.len().saturating_sub(1));
                MutationOutcome::Deleted { id, removed }
            }
        };

        ctx.outcome = Some(outcome);
        Ok(())
    }
}
