//! Request schema
//!
//! Maps each request name to its ordered argument names. Hosts use it to
//! check envelopes before the handler runs; the table itself is checked once,
//! when it is built.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use crate::observability::Logger;

use super::errors::{ApiError, ApiResult};

/// Every request the handler can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    StoreNewUser,
    GetAllUsers,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::StoreNewUser, Operation::GetAllUsers];

    /// Wire name of the request
    pub fn name(&self) -> &'static str {
        match self {
            Operation::StoreNewUser => "store_new_user",
            Operation::GetAllUsers => "get_all_users",
        }
    }

    /// Argument names, in positional order
    pub fn arg_names(&self) -> &'static [&'static str] {
        match self {
            Operation::StoreNewUser => &["name", "url", "languages", "year"],
            Operation::GetAllUsers => &[],
        }
    }
}

/// Validated request-name to argument-list table
#[derive(Debug, Clone)]
pub struct RequestSchema {
    operations: BTreeMap<&'static str, Operation>,
}

impl RequestSchema {
    /// Build a schema from a set of operations.
    ///
    /// Fails on a repeated request name or a repeated argument name.
    pub fn new(operations: impl IntoIterator<Item = Operation>) -> ApiResult<Self> {
        let mut table = BTreeMap::new();
        for op in operations {
            let mut seen = HashSet::new();
            for arg in op.arg_names() {
                if !seen.insert(*arg) {
                    return Err(ApiError::schema_invalid(format!(
                        "Duplicate argument '{}' in request '{}'",
                        arg,
                        op.name()
                    )));
                }
            }
            if table.insert(op.name(), op).is_some() {
                return Err(ApiError::schema_invalid(format!(
                    "Request '{}' registered twice",
                    op.name()
                )));
            }
        }
        Ok(Self { operations: table })
    }

    /// The schema covering every operation.
    ///
    /// Built through `new`, so the operation table passes the same checks as
    /// any other schema. A table that fails them is logged at FATAL and
    /// serves nothing; every request then fails as unknown.
    pub fn standard() -> Self {
        match Self::new(Operation::ALL) {
            Ok(schema) => schema,
            Err(e) => {
                Logger::fatal(
                    "SCHEMA_INVALID",
                    &[("code", e.code()), ("message", e.message())],
                );
                Self {
                    operations: BTreeMap::new(),
                }
            }
        }
    }

    /// Resolve a request name
    pub fn lookup(&self, request: &str) -> ApiResult<Operation> {
        self.operations
            .get(request)
            .copied()
            .ok_or_else(|| ApiError::unknown_operation(request))
    }

    /// Check `args` against the schema and return them keyed by name.
    ///
    /// `args` may be an object keyed by argument name or an array in
    /// positional order. A missing `args` is accepted only for requests
    /// without arguments. The names must match exactly: nothing missing,
    /// nothing extra.
    pub fn bind_args(&self, op: Operation, args: Option<&Value>) -> ApiResult<Map<String, Value>> {
        let expected = op.arg_names();

        let bound = match args {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Array(values)) => {
                if values.len() != expected.len() {
                    return Err(ApiError::invalid_request(format!(
                        "Request '{}' takes {} argument(s), got {}",
                        op.name(),
                        expected.len(),
                        values.len()
                    )));
                }
                expected
                    .iter()
                    .map(|name| name.to_string())
                    .zip(values.iter().cloned())
                    .collect()
            }
            Some(other) => {
                return Err(ApiError::invalid_request(format!(
                    "Arguments must be an object or an array, got {}",
                    json_type_name(other)
                )))
            }
        };

        for name in expected {
            if !bound.contains_key(*name) {
                return Err(ApiError::invalid_request(format!("Missing argument: {}", name)));
            }
        }
        if let Some(extra) = bound.keys().find(|k| !expected.contains(&k.as_str())) {
            return Err(ApiError::invalid_request(format!("Unexpected argument: {}", extra)));
        }

        Ok(bound)
    }

    /// Render as `{request: [arg, ...]}`
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .operations
            .iter()
            .map(|(name, op)| {
                let args = op.arg_names().iter().map(|a| Value::from(*a)).collect();
                (name.to_string(), Value::Array(args))
            })
            .collect();
        Value::Object(map)
    }
}

impl Default for RequestSchema {
    fn default() -> Self {
        Self::standard()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
