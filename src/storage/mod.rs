//! Durable storage for user records
//!
//! # Design Principles
//!
//! - One backing file holds the entire record set as a JSON array
//! - Full-document rewrites via temp file, fsync and rename
//! - One lock per backing file around every read-modify-write
//! - A missing or malformed document reads as empty; other read failures are errors

mod document;
mod errors;
mod lock;
mod record;

pub use document::DurableStore;
pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use record::{RecordSet, UserRecord, Year};
