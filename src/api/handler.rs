//! Request handler for the user database
//!
//! Dispatches validated requests to the durable store. Serialization of
//! writers happens inside the store, so a handler can be shared across
//! threads behind an `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::observability::{Logger, MetricsRegistry};
use crate::storage::{DurableStore, Year};

use super::errors::{ApiError, ApiResult};
use super::request::{Request, StoreNewUserRequest};
use super::response::RpcResult;
use super::schema::RequestSchema;

/// Handler serving `store_new_user` and `get_all_users`
pub struct UserDatabaseHandler {
    schema: RequestSchema,
    store: DurableStore,
    metrics: Arc<MetricsRegistry>,
}

impl UserDatabaseHandler {
    /// Name the host registers this handler under
    pub const NAME: &'static str = "user_database";

    /// Create a handler over an existing store
    pub fn new(store: DurableStore) -> Self {
        Self {
            schema: RequestSchema::standard(),
            metrics: Arc::clone(store.metrics()),
            store,
        }
    }

    /// Create a handler backed by the file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(DurableStore::open(path))
    }

    pub fn schema(&self) -> &RequestSchema {
        &self.schema
    }

    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Handle a request given by name and raw arguments.
    ///
    /// Schema violations become a `Failure` without touching the store.
    pub fn handle_raw(&self, name: &str, args: Option<&Value>) -> RpcResult {
        match Request::bind(&self.schema, name, args) {
            Ok(request) => self.handle(request),
            Err(e) => self.fail(name, e),
        }
    }

    /// Dispatch a validated request
    pub fn handle(&self, request: Request) -> RpcResult {
        let name = request.operation().name();
        let result = match request {
            Request::StoreNewUser(r) => self.do_store_new_user(r),
            Request::GetAllUsers => self.do_get_all_users(),
        };

        match result {
            Ok(data) => {
                self.metrics.increment_requests_succeeded();
                RpcResult::success(data)
            }
            Err(e) => self.fail(name, e),
        }
    }

    /// Append one user and persist the whole record set.
    ///
    /// Succeeds with exactly `{"exit_code": 0}`, and only after the new
    /// document is durably in place.
    pub fn store_new_user(&self, req: StoreNewUserRequest) -> RpcResult {
        self.handle(Request::StoreNewUser(req))
    }

    /// Return every stored user in insertion order; `[]` when there are none
    pub fn get_all_users(&self) -> RpcResult {
        self.handle(Request::GetAllUsers)
    }

    fn do_store_new_user(&self, req: StoreNewUserRequest) -> ApiResult<Value> {
        let year = match &req.year {
            Some(Year::Number(n)) => n.to_string(),
            Some(Year::Text(s)) => s.clone(),
            None => String::new(),
        };
        Logger::info(
            "STORE_NEW_USER_RECEIVED",
            &[
                ("languages", req.languages.as_str()),
                ("name", req.name.as_str()),
                ("url", req.url.as_str()),
                ("year", year.as_str()),
            ],
        );

        let count = self.store.append(req.into_record())?;
        Logger::trace("STORE_NEW_USER_PERSISTED", &[("records", count.to_string().as_str())]);

        Ok(json!({"exit_code": 0}))
    }

    fn do_get_all_users(&self) -> ApiResult<Value> {
        Logger::info("GET_ALL_USERS_RECEIVED", &[]);

        let records = self.store.load()?;
        let count = records.len().to_string();
        let data = serde_json::to_value(records.into_vec())
            .map_err(|e| ApiError::from_store_error(e.into()))?;

        Logger::trace("GET_ALL_USERS_SENDING", &[("records", count.as_str())]);
        Ok(data)
    }

    fn fail(&self, request: &str, err: ApiError) -> RpcResult {
        self.metrics.increment_requests_failed();
        Logger::error(
            "REQUEST_FAILED",
            &[
                ("code", err.code()),
                ("message", err.message()),
                ("request", request),
            ],
        );
        RpcResult::error(&err)
    }
}
