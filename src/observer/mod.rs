// Observer system for processing object mutations through a ring pipeline

pub mod context;
pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod traits;

// Re-export core types
pub use context::*;
pub use error::*;
pub use implementations::default_pipeline;
pub use pipeline::*;
pub use traits::*;
