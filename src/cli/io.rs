//! Line-delimited JSON envelopes
//!
//! - Input: one JSON object per line
//! - Output: one JSON object per line
//! - UTF-8 only
//!
//! Request envelope:
//!
//! ```json
//! {"id": 1, "request": "store_new_user", "args": {"name": "Alice", "url": "u1", "languages": "C", "year": 2020}}
//! ```

use std::io::Write;

use serde::Deserialize;
use serde_json::Value;

use super::errors::CliResult;

/// Inbound request envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Echoed back unchanged so clients can match responses
    #[serde(default)]
    pub id: Option<Value>,
    pub request: String,
    #[serde(default)]
    pub args: Option<Value>,
}

impl Envelope {
    /// Parse one input line
    pub fn parse(line: &str) -> Result<Self, String> {
        serde_json::from_str(line).map_err(|e| format!("Invalid envelope: {}", e))
    }
}

/// Write one JSON value as a line and flush
pub fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_envelope() {
        let env = Envelope::parse(r#"{"id": "a1", "request": "get_all_users"}"#).unwrap();
        assert_eq!(env.id, Some(json!("a1")));
        assert_eq!(env.request, "get_all_users");
        assert!(env.args.is_none());
    }

    #[test]
    fn test_parse_envelope_missing_request() {
        let err = Envelope::parse(r#"{"id": 1}"#).unwrap_err();
        assert!(err.contains("request"));
    }

    #[test]
    fn test_write_line() {
        let mut out = Vec::new();
        write_line(&mut out, &json!({"result": "success"})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"result\":\"success\"}\n");
    }
}
