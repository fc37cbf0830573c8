use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::executor::CommandResult;

/// Output mode for rendering command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Indented JSON with the given number of spaces per level.
    Pretty { spacing: usize },
    /// Compact single-line JSON.
    Raw,
}

/// Render a command result to stdout.
pub fn render(result: &CommandResult, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, result, mode)
}

pub fn write_result(out: &mut impl Write, result: &CommandResult, mode: OutputMode) -> io::Result<()> {
    match result {
        CommandResult::Value(value) => writeln!(out, "{}", format_value(value, mode)),
        CommandResult::Ok(msg) => writeln!(out, "{msg}"),
    }
}

/// Objects and arrays print as JSON; scalars print bare, so a string
/// value comes out without quotes.
pub fn format_value(value: &Value, mode: OutputMode) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => to_json(value, mode),
    }
}

pub fn to_json(value: &Value, mode: OutputMode) -> String {
    match mode {
        OutputMode::Raw => value.to_string(),
        OutputMode::Pretty { spacing } => {
            let indent = vec![b' '; spacing];
            let mut buf = Vec::new();
            let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
            match value.serialize(&mut ser) {
                Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
                Err(_) => value.to_string(),
            }
        }
    }
}

pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("Error: {err}");
}
