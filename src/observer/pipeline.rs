// Observer pipeline: runs registered observers ring by ring for one mutation.
// Synchronous rings stop at the first ring that records an error; nothing is
// written when a pre-database ring fails. Async rings only see committed work.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::observer::context::{MutationOutcome, ObserverContext};
use crate::observer::error::{ObserverError, ObserverWarning};
use crate::observer::traits::{ObserverBox, ObserverRing};

/// Successful pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub outcome: MutationOutcome,
    pub warnings: Vec<ObserverWarning>,
    pub execution_time: Duration,
}

pub struct ObserverPipeline {
    // Observer registry by ring, each ring sorted by priority
    observers: BTreeMap<ObserverRing, Vec<ObserverBox>>,
    // Replaces every observer's own timeout when set
    timeout_override: Option<Duration>,
}

impl ObserverPipeline {
    pub fn new() -> Self {
        Self {
            observers: BTreeMap::new(),
            timeout_override: None,
        }
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout_override = Some(limit);
        self
    }

    pub fn register_observer(&mut self, observer: ObserverBox) {
        let ring = observer.ring();
        let name = observer.name();
        let ring_observers = self.observers.entry(ring).or_default();
        ring_observers.push(observer);
        ring_observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for ring {:?}", name, ring);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }

    pub async fn execute(&self, mut ctx: ObserverContext) -> Result<PipelineResult, ObserverError> {
        tracing::debug!(
            "Observer pipeline starting: operation={}, target={:?}",
            ctx.operation.as_str(),
            ctx.target_id
        );

        // Execute synchronous rings (0-6) in sequence
        for ring in ObserverRing::ALL.into_iter().filter(ObserverRing::is_synchronous) {
            ctx.current_ring = Some(ring);
            self.execute_ring(ring, &mut ctx).await;

            if ctx.has_errors() {
                tracing::warn!(
                    "Observer pipeline stopped at ring {:?} with {} error(s)",
                    ring,
                    ctx.errors.len()
                );
                return Err(ctx.errors.swap_remove(0));
            }
        }

        let outcome = ctx.outcome.clone().ok_or_else(|| {
            ObserverError::PipelineError(format!(
                "no observer produced a result for {}",
                ctx.operation.as_str()
            ))
        })?;

        // Execute asynchronous rings (7-9) after the write succeeded
        self.execute_async_rings(&mut ctx).await;

        let execution_time = ctx.execution_time();
        tracing::debug!(
            "Observer pipeline finished {} in {:?}",
            ctx.operation.as_str(),
            execution_time
        );

        Ok(PipelineResult {
            outcome,
            warnings: ctx.warnings,
            execution_time,
        })
    }

    fn limit_for(&self, observer: &ObserverBox) -> Duration {
        self.timeout_override.unwrap_or_else(|| observer.timeout())
    }

    async fn execute_ring(&self, ring: ObserverRing, ctx: &mut ObserverContext) {
        let observers = match self.observers.get(&ring) {
            Some(obs) => obs,
            None => {
                tracing::trace!("No observers registered for ring {:?}", ring);
                return;
            }
        };

        for observer in observers {
            if !observer.applies_to_operation(ctx.operation) {
                tracing::trace!(
                    "Observer {} skipped - doesn't apply to operation {:?}",
                    observer.name(),
                    ctx.operation
                );
                continue;
            }

            let observer_start = Instant::now();
            let limit = self.limit_for(observer);

            // Execute with timeout protection
            match timeout(limit, observer.execute_sync(ctx)).await {
                Ok(Ok(())) => {
                    tracing::trace!(
                        "Observer: {} completed in {:?}",
                        observer.name(),
                        observer_start.elapsed()
                    );
                }
                Ok(Err(error)) => {
                    tracing::debug!("Observer: {} rejected mutation: {}", observer.name(), error);
                    ctx.errors.push(error);
                }
                Err(_elapsed) => {
                    tracing::error!("Observer: {} timed out after {:?}", observer.name(), limit);
                    ctx.errors.push(ObserverError::TimeoutError(format!(
                        "Observer {} timed out after {:?}",
                        observer.name(),
                        limit
                    )));
                }
            }

            // Later observers in the ring assume earlier ones passed
            if ctx.has_errors() {
                return;
            }
        }
    }

    async fn execute_async_rings(&self, ctx: &mut ObserverContext) {
        let mut warnings = Vec::new();

        for ring in ObserverRing::ALL.into_iter().filter(|r| !r.is_synchronous()) {
            let Some(observers) = self.observers.get(&ring) else {
                continue;
            };
            ctx.current_ring = Some(ring);

            for observer in observers.iter().filter(|o| o.applies_to_operation(ctx.operation)) {
                let limit = self.limit_for(observer);
                let message = match timeout(limit, observer.execute_async(ctx)).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(error)) => error.to_string(),
                    Err(_elapsed) => format!("timed out after {:?}", limit),
                };
                tracing::warn!("Async observer {} failed: {}", observer.name(), message);
                warnings.push(ObserverWarning::new(observer.name(), ring as u8, message));
            }
        }

        for warning in warnings {
            ctx.add_warning(warning);
        }
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateObjectInput, ObjectKind, ObjectNode};
    use crate::observer::traits::{AsyncObserver, Observer, SyncObserver};
    use crate::store::{MemoryStore, ObjectStore};
    use crate::types::Operation;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Reject;

    impl Observer for Reject {
        fn name(&self) -> &'static str {
            "Reject"
        }
        fn ring(&self) -> ObserverRing {
            ObserverRing::Business
        }
        fn applies_to_operation(&self, _op: Operation) -> bool {
            true
        }
    }

    #[async_trait]
    impl SyncObserver for Reject {
        async fn execute(&self, _ctx: &mut ObserverContext) -> Result<(), ObserverError> {
            Err(ObserverError::business("nope"))
        }
    }

    struct Write(Arc<AtomicUsize>);

    impl Observer for Write {
        fn name(&self) -> &'static str {
            "Write"
        }
        fn ring(&self) -> ObserverRing {
            ObserverRing::Database
        }
        fn applies_to_operation(&self, _op: Operation) -> bool {
            true
        }
    }

    #[async_trait]
    impl SyncObserver for Write {
        async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let input = ctx.create.clone().ok_or_else(|| ObserverError::PipelineError("no input".into()))?;
            ctx.outcome = Some(MutationOutcome::Created(ObjectNode::from_input(input, chrono::Utc::now())));
            Ok(())
        }
    }

    struct Stall;

    impl Observer for Stall {
        fn name(&self) -> &'static str {
            "Stall"
        }
        fn ring(&self) -> ObserverRing {
            ObserverRing::Notification
        }
        fn applies_to_operation(&self, _op: Operation) -> bool {
            true
        }
    }

    #[async_trait]
    impl AsyncObserver for Stall {
        async fn execute(&self, _ctx: &ObserverContext) -> Result<(), ObserverError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn ctx() -> ObserverContext {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new());
        ObserverContext::for_create(store, CreateObjectInput::new("HQ", ObjectKind::Organization, 0))
    }

    #[tokio::test]
    async fn business_failure_skips_database_ring() {
        let writes = Arc::new(AtomicUsize::new(0));
        let mut pipeline = ObserverPipeline::new();
        pipeline.register_observer(ObserverBox::sync(Write(Arc::clone(&writes))));
        pipeline.register_observer(ObserverBox::sync(Reject));

        let err = pipeline.execute(ctx()).await.unwrap_err();

        assert_eq!(err, ObserverError::BusinessRule("nope".into()));
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_database_observer_is_a_pipeline_error() {
        let pipeline = ObserverPipeline::new();
        assert!(matches!(pipeline.execute(ctx()).await, Err(ObserverError::PipelineError(_))));
    }

    #[tokio::test]
    async fn async_timeout_becomes_warning() {
        let mut pipeline = ObserverPipeline::new().with_timeout(Duration::from_millis(20));
        pipeline.register_observer(ObserverBox::sync(Write(Arc::new(AtomicUsize::new(0)))));
        pipeline.register_observer(ObserverBox::asynchronous(Stall));

        let result = pipeline.execute(ctx()).await.unwrap();

        assert!(matches!(result.outcome, MutationOutcome::Created(_)));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].observer, "Stall");
    }
}
