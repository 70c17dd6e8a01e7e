//! On-disk persona record and legacy format migration
//!
//! - **Version**: 2.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.1.0: Wrapped records load leniently; mistyped fields read as absent instead of failing the file
//! - 2.0.0: Wrapped format with inference cache and system meta; bare slot maps migrate on load
//! - 1.0.0: Bare slot mapping per file

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::core::join_non_empty;

/// LLM scratch-space key; never persisted
pub const REASONING_KEY: &str = "reasoning";

/// Top-level keys that mark a record as already wrapped
const WRAPPER_KEYS: [&str; 3] = ["updated_state", "inference_cache", "system_meta"];

/// Semantic tag categories of a persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Character,
    Outfit,
    Action,
    Location,
    Composition,
    Style,
    Meta,
}

impl Slot {
    pub const ALL: [Slot; 7] = [
        Slot::Character,
        Slot::Outfit,
        Slot::Action,
        Slot::Location,
        Slot::Composition,
        Slot::Style,
        Slot::Meta,
    ];

    /// Order used when a prompt has to be rebuilt from the slots
    pub const PROMPT_ORDER: [Slot; 7] = [
        Slot::Style,
        Slot::Character,
        Slot::Outfit,
        Slot::Action,
        Slot::Location,
        Slot::Composition,
        Slot::Meta,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Slot::Character => "character",
            Slot::Outfit => "outfit",
            Slot::Action => "action",
            Slot::Location => "location",
            Slot::Composition => "composition",
            Slot::Style => "style",
            Slot::Meta => "meta",
        }
    }
}

/// Ordered slot mapping. Unknown keys pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaState(Map<String, Value>);

impl PersonaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Tag string stored in a slot.
    ///
    /// Strings are returned as-is, arrays of strings are joined with `", "`,
    /// anything else (including a missing key) reads as empty.
    pub fn slot(&self, slot: Slot) -> String {
        match self.0.get(slot.key()) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => join_non_empty(items.iter().filter_map(Value::as_str)),
            _ => String::new(),
        }
    }

    pub fn set_slot(&mut self, slot: Slot, tags: impl Into<String>) {
        self.0.insert(slot.key().to_string(), Value::String(tags.into()));
    }

    /// Remove the `reasoning` key, returning whether it was present
    pub fn strip_reasoning(&mut self) -> bool {
        self.0.shift_remove(REASONING_KEY).is_some()
    }

    /// Rebuild a positive prompt from the non-empty slots in prompt order
    pub fn compose_prompt(&self) -> String {
        let parts: Vec<String> = Slot::PROMPT_ORDER.iter().map(|s| self.slot(*s)).collect();
        join_non_empty(parts.iter().map(String::as_str))
    }

    /// Pretty JSON (2-space indent) used for the LLM context and debug output
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Prompts computed by the last successful round-trip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceCache {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMeta {
    /// Instruction that produced the current cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_instruction: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Parse an RFC 3339 or naive ISO 8601 timestamp (naive values are taken as UTC)
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Unparsable or non-string timestamps read as `None`
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(parse_timestamp))
}

/// Unit of persistence: one file per persona
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub updated_state: PersonaState,
    pub inference_cache: InferenceCache,
    pub system_meta: SystemMeta,
}

impl PersonaRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a persona file's contents, migrating legacy shapes.
    ///
    /// Only invalid JSON is an error; every JSON value maps to some record.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(contents)?;
        Ok(Self::from_value(value))
    }

    /// Normalize any JSON shape into a wrapped record.
    ///
    /// - all three wrapper keys present: accepted as-is, mistyped fields read as absent
    /// - bare slot mapping (has `character`): wrapped with an empty cache and meta
    /// - anything else: empty record
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::empty();
        };

        if WRAPPER_KEYS.iter().all(|k| map.contains_key(*k)) {
            return Self::from_wrapped(map);
        }

        if map.contains_key(Slot::Character.key()) {
            return Self {
                updated_state: PersonaState::from_map(map),
                ..Self::default()
            };
        }

        Self::empty()
    }

    fn from_wrapped(mut map: Map<String, Value>) -> Self {
        let updated_state = match map.remove("updated_state") {
            Some(Value::Object(state)) => PersonaState::from_map(state),
            _ => PersonaState::new(),
        };
        let cache = map.get("inference_cache");
        let meta = map.get("system_meta");

        Self {
            updated_state,
            inference_cache: InferenceCache {
                positive_prompt: string_field(cache, "positive_prompt"),
                negative_prompt: string_field(cache, "negative_prompt"),
            },
            system_meta: SystemMeta {
                last_instruction: string_field(meta, "last_instruction"),
                updated_at: meta
                    .and_then(|m| m.get("updated_at"))
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp),
            },
        }
    }

    /// Cached (positive, negative) prompts, empty when never computed
    pub fn cached_prompts(&self) -> (String, String) {
        (
            self.inference_cache.positive_prompt.clone().unwrap_or_default(),
            self.inference_cache.negative_prompt.clone().unwrap_or_default(),
        )
    }

    pub fn last_instruction(&self) -> Option<&str> {
        self.system_meta.last_instruction.as_deref()
    }
}

fn string_field(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|s| s.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}
