//! API layer for the user database
//!
//! # Design Principles
//!
//! - Static schema, checked once when built
//! - Typed request variants; the handler never sees raw arguments
//! - Every invocation returns exactly one `RpcResult`, never panics
//! - Store error codes passed through unchanged
//!
//! # Supported Operations
//!
//! - store_new_user(name, url, languages, year)
//! - get_all_users()

mod errors;
mod handler;
mod request;
mod response;
mod schema;

pub use errors::{ApiError, ApiErrorCode, ApiResult};
pub use handler::UserDatabaseHandler;
pub use request::{Request, StoreNewUserRequest};
pub use response::RpcResult;
pub use schema::{Operation, RequestSchema};
