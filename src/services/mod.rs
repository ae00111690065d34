pub mod actions;
pub mod error;
pub mod object_service;

pub use actions::{ActionError, ActionResult, ErrorKind, ObjectActions};
pub use error::ServiceError;
pub use object_service::{InteractionOutcome, ObjectService};
