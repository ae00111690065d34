pub mod response;

pub use response::{respond, respond_created, ApiResponse, ApiResult};
