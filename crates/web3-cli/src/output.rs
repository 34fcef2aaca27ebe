//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::CliError;

/// Output format selected with `--format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    Text,
    /// Pretty printed JSON
    Json,
}

/// Output builder for formatted CLI output
pub struct Output {
    json_mode: bool,
    fields: Map<String, Value>,
    lines: Vec<String>,
}

impl Output {
    /// Create a new output builder
    pub fn new(json_mode: bool) -> Self {
        Self {
            json_mode,
            fields: Map::new(),
            lines: Vec::new(),
        }
    }

    /// Add a string field to the output
    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Add a JSON value field to the output
    pub fn field_value(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Append a human-readable line
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Print the output
    pub fn print(self) {
        if self.json_mode {
            println!(
                "{}",
                serde_json::to_string_pretty(&Value::Object(self.fields)).unwrap_or_default()
            );
        } else {
            for line in self.lines {
                println!("{}", line);
            }
        }
    }
}

/// Print any serializable value as indented JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a converted ABI value the way a user typed it
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Interpret a hex encoded byte value as text, dropping NUL padding
pub fn value_as_text(value: &Value) -> String {
    let text = display_value(value);
    match text.strip_prefix("0x").map(hex::decode) {
        Some(Ok(bytes)) => String::from_utf8_lossy(&bytes)
            .trim_end_matches('\0')
            .to_string(),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("0xabc")), "0xabc");
        assert_eq!(display_value(&json!(18)), "18");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!(["a", 1])), "[\"a\",1]");
    }

    #[test]
    fn test_value_as_text() {
        let padded = format!("0x{}{}", hex::encode("GOO"), "00".repeat(29));
        assert_eq!(value_as_text(&json!(padded)), "GOO");
        assert_eq!(value_as_text(&json!("plain")), "plain");
        assert_eq!(value_as_text(&json!(7)), "7");
    }
}
