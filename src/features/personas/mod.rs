//! # Personas Feature
//!
//! Named, evolving character descriptions persisted one JSON file per persona.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Wrapped record format with legacy migration, file-backed store
//! - 1.0.0: Initial release

pub mod choices;
pub mod prompt_builder;
pub mod record;
pub mod store;

pub use choices::{selector_options, CREATE_SMART_CHOICE, FORCE_RESET_CHOICE};
pub use prompt_builder::PromptBuilder;
pub use record::{InferenceCache, PersonaRecord, PersonaState, Slot, SystemMeta};
pub use store::{persona_filename, sanitize_name, PersonaStore, Resolution, Selector};
