//! user_database - an RPC handler that keeps user records in a durable JSON document

pub mod api;
pub mod cli;
pub mod observability;
pub mod storage;

pub use api::{RpcResult, UserDatabaseHandler};
pub use storage::{DurableStore, RecordSet, UserRecord, Year};
