//! API request types
//!
//! Each request is a tagged variant with a typed argument struct. Hosts
//! build them from envelope arguments through `Request::bind`, which checks
//! the argument names against the schema before decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{UserRecord, Year};

use super::errors::{ApiError, ApiResult};
use super::schema::{Operation, RequestSchema};

/// Arguments of `store_new_user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreNewUserRequest {
    pub name: String,
    pub url: String,
    pub languages: String,
    /// `null` is accepted and stored as "no year"
    pub year: Option<Year>,
}

impl StoreNewUserRequest {
    pub fn into_record(self) -> UserRecord {
        UserRecord::new(self.name, self.url, self.languages, self.year)
    }
}

/// A validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    StoreNewUser(StoreNewUserRequest),
    GetAllUsers,
}

impl Request {
    /// Resolve `name` in `schema`, check `args`, decode the typed arguments
    pub fn bind(schema: &RequestSchema, name: &str, args: Option<&Value>) -> ApiResult<Self> {
        let op = schema.lookup(name)?;
        let bound = schema.bind_args(op, args)?;

        match op {
            Operation::StoreNewUser => {
                let req: StoreNewUserRequest = serde_json::from_value(Value::Object(bound))
                    .map_err(|e| ApiError::invalid_request(format!("Invalid arguments: {}", e)))?;
                Ok(Request::StoreNewUser(req))
            }
            Operation::GetAllUsers => Ok(Request::GetAllUsers),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Request::StoreNewUser(_) => Operation::StoreNewUser,
            Request::GetAllUsers => Operation::GetAllUsers,
        }
    }
}
