// Ring 9: Notification - tells every live view what changed
use async_trait::async_trait;

use crate::events::{EventBus, ObjectEvent};
use crate::observer::context::{MutationOutcome, ObserverContext};
use crate::observer::error::ObserverError;
use crate::observer::traits::{AsyncObserver, Observer, ObserverRing};
use crate::types::Operation;

pub struct EventPublisher {
    bus: EventBus,
}

impl EventPublisher {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl Observer for EventPublisher {
    fn name(&self) -> &'static str {
        "EventPublisher"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Notification
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }
}

/// Events describing a committed mutation, in publication order
pub fn events_for(outcome: &MutationOutcome) -> Vec<ObjectEvent> {
    match outcome {
        MutationOutcome::Created(node) => vec![ObjectEvent::Created { node: node.clone() }],
        MutationOutcome::Updated { before, after } => {
            let mut events = vec![ObjectEvent::Updated { node: after.clone() }];
            if before.parent_id != after.parent_id {
                events.push(ObjectEvent::ParentChanged {
                    id: after.id,
                    old_parent: before.parent_id,
                    new_parent: after.parent_id,
                });
            }
            events
        }
        MutationOutcome::Deleted { id, removed } => vec![ObjectEvent::Deleted {
            id: *id,
            removed: removed.clone(),
        }],
    }
}

#[async_trait]
impl AsyncObserver for EventPublisher {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let outcome = ctx
            .outcome
            .as_ref()
            .ok_or_else(|| ObserverError::PipelineError("nothing to publish".to_string()))?;

        for event in events_for(outcome) {
            self.bus.publish(event);
        }
        Ok(())
    }
}
