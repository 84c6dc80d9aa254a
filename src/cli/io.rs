//! JSON I/O handling for CLI
//!
//! - Input: one JSON document from a file or stdin
//! - Output: one JSON envelope on stdout

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read a JSON payload from `input`, or stdin when none is given
pub fn read_payload(input: Option<&Path>) -> CliResult<Value> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().lock().read_to_string(&mut text)?;
            text
        }
    };

    parse_payload(&text)
}

/// Parse payload text, rejecting empty input
pub fn parse_payload(text: &str) -> CliResult<Value> {
    if text.trim().is_empty() {
        return Err(CliError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Empty input",
        )));
    }
    Ok(serde_json::from_str(text)?)
}

/// Build the success envelope
pub fn success_envelope(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// Build the error envelope
pub fn error_envelope(err: &CliError) -> Value {
    let mut envelope = json!({
        "status": "error",
        "code": err.code(),
        "message": err.message()
    });
    if let CliError::Schema(schema_err) = err {
        if let Some(details) = schema_err.details() {
            envelope["details"] = json!(details);
        }
    }
    envelope
}

/// Write a JSON value to stdout as one document
pub fn write_json(value: &Value, pretty: bool) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
