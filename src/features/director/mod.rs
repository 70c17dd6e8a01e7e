//! # Feature: Persona Director
//!
//! Turns a free-text instruction into positive/negative image prompts by evolving a
//! persisted persona through an LLM round-trip.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Per-persona locking
//! - 1.1.0: Short-circuit on repeated instructions, inference cache
//! - 1.0.0: Initial release

pub mod merge;
pub mod orchestrator;
pub mod parser;

pub use merge::{assemble, merge, MergedUpdate};
pub use orchestrator::{Director, GenerateRequest, PromptOutput, TEMPERATURE};
pub use parser::{parse, JsonObject};
