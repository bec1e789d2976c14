//! RPC result type
//!
//! Every handler invocation produces exactly one `RpcResult`.

use serde_json::{json, Value};

use super::errors::ApiError;

/// Tagged success/failure returned to the host
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResult {
    Success(Value),
    Failure(String),
}

impl RpcResult {
    /// Create a success result
    pub fn success(data: Value) -> Self {
        RpcResult::Success(data)
    }

    /// Create a failure result
    pub fn failure(reason: impl Into<String>) -> Self {
        RpcResult::Failure(reason.into())
    }

    /// Create a failure result from an API error
    pub fn error(err: &ApiError) -> Self {
        RpcResult::Failure(err.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RpcResult::Success(_))
    }

    /// Success payload, if any
    pub fn data(&self) -> Option<&Value> {
        match self {
            RpcResult::Success(data) => Some(data),
            RpcResult::Failure(_) => None,
        }
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            RpcResult::Success(_) => None,
            RpcResult::Failure(reason) => Some(reason),
        }
    }

    /// Wire form: `{"id", "result": "success", "data"}` or
    /// `{"id", "result": "failure", "reason"}`
    pub fn to_envelope(&self, id: Option<&Value>) -> Value {
        let id = id.cloned().unwrap_or(Value::Null);
        match self {
            RpcResult::Success(data) => json!({"id": id, "result": "success", "data": data}),
            RpcResult::Failure(reason) => json!({"id": id, "result": "failure", "reason": reason}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let result = RpcResult::success(json!([{"name": "Alice"}]));
        let env = result.to_envelope(Some(&json!(7)));
        assert_eq!(env["id"], 7);
        assert_eq!(env["result"], "success");
        assert_eq!(env["data"][0]["name"], "Alice");
    }

    #[test]
    fn test_failure_envelope() {
        let err = ApiError::invalid_request("Missing argument: name");
        let result = RpcResult::error(&err);
        assert!(!result.is_success());
        assert_eq!(result.reason(), Some("USERDB_INVALID_REQUEST: Missing argument: name"));

        let env = result.to_envelope(None);
        assert_eq!(env["id"], Value::Null);
        assert_eq!(env["result"], "failure");
        assert!(env.get("data").is_none());
    }
}
