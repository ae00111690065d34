// Observer implementations organized by rings
// Each ring handles a specific phase of a mutation

use std::time::Duration;

use crate::config::AppConfig;
use crate::events::EventBus;
use crate::observer::pipeline::ObserverPipeline;
use crate::observer::traits::ObserverBox;

// Ring 0: Data Preparation - load target and parent chain
#[path = "0/data_preparation.rs"]
pub mod data_preparation;

// Ring 1: Input Validation - field checks
#[path = "1/input_validation.rs"]
pub mod input_validation;

// Ring 3: Business - hierarchy rules
#[path = "3/cycle_guard.rs"]
pub mod cycle_guard;
#[path = "3/level_guard.rs"]
pub mod level_guard;

// Ring 5: Database - store execution
#[path = "5/store_executor.rs"]
pub mod store_executor;

// Ring 7: Audit - change log
#[path = "7/audit_log.rs"]
pub mod audit_log;

// Ring 9: Notification - event bus
#[path = "9/event_publisher.rs"]
pub mod event_publisher;

pub use audit_log::AuditLogObserver;
pub use cycle_guard::CycleGuard;
pub use data_preparation::DataPreparationObserver;
pub use event_publisher::{events_for, EventPublisher};
pub use input_validation::InputValidationObserver;
pub use level_guard::LevelGuard;
pub use store_executor::StoreExecutor;

/// Full mutation pipeline for the object hierarchy
pub fn default_pipeline(bus: EventBus, config: &AppConfig) -> ObserverPipeline {
    let mut pipeline =
        ObserverPipeline::new().with_timeout(Duration::from_millis(config.observer.timeout_ms.max(1)));

    pipeline.register_observer(ObserverBox::sync(DataPreparationObserver));
    pipeline.register_observer(ObserverBox::sync(InputValidationObserver));
    pipeline.register_observer(ObserverBox::sync(LevelGuard::new(config.hierarchy.enforce_level_on_update)));
    if config.hierarchy.reject_cycles {
        pipeline.register_observer(ObserverBox::sync(CycleGuard));
    }
    pipeline.register_observer(ObserverBox::sync(StoreExecutor));
    pipeline.register_observer(ObserverBox::asynchronous(AuditLogObserver));
    pipeline.register_observer(ObserverBox::asynchronous(EventPublisher::new(bus)));

    tracing::debug!("Observer pipeline ready with {} observers", pipeline.observer_count());
    pipeline
}
