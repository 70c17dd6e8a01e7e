//! # Core Module
//!
//! Configuration, error taxonomy and tag handling shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add tags module with the prompt tag normalizer
//! - 1.0.0: Initial creation with config and error modules

pub mod config;
pub mod error;
pub mod tags;

// Re-export commonly used items
pub use config::{Config, QualityTags};
pub use error::{DirectorError, DirectorResult};
pub use tags::{join_non_empty, normalize, TAG_SEPARATOR};
