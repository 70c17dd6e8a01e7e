//! # Feature: Prompt Templates
//!
//! External JSON system-prompt templates rendered into the director's system prompt.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//! - **Toggleable**: false

pub mod library;
pub mod loader;

pub use library::{TemplateChoice, TemplateLibrary, BUILTIN_TEMPLATE_CHOICE};
pub use loader::{load, PromptTemplate};
