//! # Prompt Template Schema
//!
//! JSON system-prompt templates: instructions, state schema, logic rules and
//! output format, rendered into one system prompt string.
//!
//! - **Version**: 1.0.1
//! - **Since**: 1.1.0
//!
//! ## Changelog
//! - 1.0.1: Non-ASCII characters in the rendered schema are `\uXXXX`-escaped

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::core::{DirectorError, DirectorResult};

/// A system-prompt template. All four keys are required.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptTemplate {
    /// Free-text instructions, one line per entry
    pub system_instructions: Vec<String>,

    /// Description of the expected state slots
    pub json_state_structure: Map<String, Value>,

    /// Conflict-resolution and business rules
    pub logic_rules: Vec<String>,

    /// Instructions describing the response object
    pub output_format_instructions: Vec<String>,
}

impl PromptTemplate {
    /// Load and validate a template file
    pub fn load(path: impl AsRef<Path>) -> DirectorResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DirectorError::ConfigError(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| DirectorError::ConfigError(format!("{}: {e}", path.display())))
    }

    pub fn from_json_str(contents: &str) -> DirectorResult<Self> {
        serde_json::from_str(contents).map_err(|e| DirectorError::ConfigError(e.to_string()))
    }

    /// Render the template into a single system prompt
    pub fn render(&self) -> String {
        let schema = serde_json::to_string_pretty(&self.json_state_structure)
            .map(|json| escape_non_ascii(&json))
            .unwrap_or_else(|_| "{}".to_string());

        [
            self.system_instructions.join("\n"),
            "\nJSON STATE STRUCTURE:".to_string(),
            schema,
            "\nLOGIC RULES:".to_string(),
            self.logic_rules.join("\n"),
            "\nOUTPUT FORMAT:".to_string(),
            self.output_format_instructions.join("\n"),
        ]
        .join("\n\n")
    }
}

/// Replace every non-ASCII character with its UTF-16 `\uXXXX` escape(s).
///
/// Only valid on serialized JSON, where such characters can only occur inside strings.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

/// Load a template file and render it in one step
pub fn load(path: impl AsRef<Path>) -> DirectorResult<String> {
    Ok(PromptTemplate::load(path)?.render())
}
