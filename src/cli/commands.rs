//! CLI command implementations
//!
//! The host side of the handler: it owns configuration, logging setup and
//! the transport, and hands the handler nothing but validated requests.

use std::io::{self, BufRead, Write};

use crate::api::{RequestSchema, RpcResult, UserDatabaseHandler};
use crate::observability::Logger;

use super::args::{Command, StoreOptions};
use super::config::Config;
use super::errors::CliResult;
use super::io::{write_line, Envelope};

const NOT_UTF8_REASON: &str = "Invalid envelope: request line is not valid UTF-8";

/// Run a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { options } => serve(&options),
        Command::Dump { options } => dump(&options),
        Command::Schema => schema(),
    }
}

/// Serve requests from stdin until EOF
pub fn serve(options: &StoreOptions) -> CliResult<()> {
    let handler = open_handler(options)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_stream(&handler, stdin.lock(), &mut stdout.lock())
}

/// Serve requests from `reader`, one response line per request line
pub fn serve_stream<R: BufRead, W: Write>(
    handler: &UserDatabaseHandler,
    reader: R,
    writer: &mut W,
) -> CliResult<()> {
    let store_path = handler.store().path().display().to_string();
    Logger::info(
        "HOST_STARTED",
        &[("handler", UserDatabaseHandler::NAME), ("store", store_path.as_str())],
    );

    // Lines are split as bytes; a line that is not UTF-8 fails on its own
    // instead of ending the session.
    for raw in reader.split(b'\n') {
        let mut raw = raw?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }

        let response = match String::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match Envelope::parse(&line) {
                Ok(env) => handler
                    .handle_raw(&env.request, env.args.as_ref())
                    .to_envelope(env.id.as_ref()),
                Err(reason) => RpcResult::failure(reason).to_envelope(None),
            },
            Err(_) => {
                Logger::warn("HOST_LINE_NOT_UTF8", &[]);
                RpcResult::failure(NOT_UTF8_REASON).to_envelope(None)
            }
        };
        write_line(writer, &response)?;
    }

    let fields = handler.metrics().snapshot().to_fields();
    let field_refs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
    Logger::info("HOST_STOPPED", &field_refs);
    Ok(())
}

/// Print every stored user as one response envelope
pub fn dump(options: &StoreOptions) -> CliResult<()> {
    let handler = open_handler(options)?;
    let response = handler.get_all_users().to_envelope(None);
    write_line(&mut io::stdout().lock(), &response)
}

/// Print the request schema
pub fn schema() -> CliResult<()> {
    write_line(&mut io::stdout().lock(), &RequestSchema::standard().to_json())
}

fn open_handler(options: &StoreOptions) -> CliResult<UserDatabaseHandler> {
    let config = Config::resolve(options)?;
    Logger::set_min_severity(config.severity()?);
    Ok(UserDatabaseHandler::open(config.store_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_lines(handler: &UserDatabaseHandler, input: &str) -> Vec<Value> {
        run_bytes(handler, input.as_bytes())
    }

    fn run_bytes(handler: &UserDatabaseHandler, input: &[u8]) -> Vec<Value> {
        let mut out = Vec::new();
        serve_stream(handler, Cursor::new(input), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_serve_round_trip() {
        let dir = TempDir::new().unwrap();
        let handler = UserDatabaseHandler::open(dir.path().join("users.json"));

        let input = concat!(
            r#"{"id": 1, "request": "store_new_user", "args": {"name": "Alice", "url": "u1", "languages": "C,Python", "year": "2020"}}"#,
            "\n\n",
            r#"{"id": 2, "request": "store_new_user", "args": ["Bob", "u2", "Rust", 2021]}"#,
            "\n",
            r#"{"id": 3, "request": "get_all_users"}"#,
            "\n",
        );
        let responses = run_lines(&handler, input);

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0], json!({"id": 1, "result": "success", "data": {"exit_code": 0}}));
        assert_eq!(responses[1]["data"], json!({"exit_code": 0}));
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(responses[2]["data"][0]["name"], "Alice");
        assert_eq!(responses[2]["data"][1]["year"], 2021);
    }

    #[test]
    fn test_serve_reports_bad_lines_and_continues() {
        let dir = TempDir::new().unwrap();
        let handler = UserDatabaseHandler::open(dir.path().join("users.json"));

        let input = "not json\n{\"id\": 9, \"request\": \"insecure_shell_cmd\"}\n{\"request\": \"get_all_users\"}\n";
        let responses = run_lines(&handler, input);

        assert_eq!(responses[0]["result"], "failure");
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["id"], 9);
        assert!(responses[1]["reason"].as_str().unwrap().contains("UNKNOWN_OPERATION"));
        assert_eq!(responses[2], json!({"id": null, "result": "success", "data": []}));
    }

    #[test]
    fn test_serve_survives_non_utf8_line() {
        let dir = TempDir::new().unwrap();
        let handler = UserDatabaseHandler::open(dir.path().join("users.json"));

        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(b"{\"id\": 2, \"request\": \"get_all_users\"}\r\n");
        let responses = run_bytes(&handler, &input);

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"], "failure");
        assert_eq!(responses[0]["reason"], NOT_UTF8_REASON);
        assert_eq!(responses[1], json!({"id": 2, "result": "success", "data": []}));
    }
}
