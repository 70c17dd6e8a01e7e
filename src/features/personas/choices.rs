//! Persona selector options
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use super::store::PersonaStore;
use crate::core::DirectorResult;

/// Load the persona if its file exists, otherwise create it
pub const CREATE_SMART_CHOICE: &str = "Create New (Smart)";

/// Start from an empty state even when the file exists
pub const FORCE_RESET_CHOICE: &str = "Force Reset (Overwrite)";

/// The two creation sentinels, in display order
pub const CREATION_CHOICES: &[&str] = &[CREATE_SMART_CHOICE, FORCE_RESET_CHOICE];

/// All selector options: creation sentinels first, then existing persona files
pub fn selector_options(store: &PersonaStore) -> DirectorResult<Vec<String>> {
    let mut options: Vec<String> = CREATION_CHOICES.iter().map(|c| c.to_string()).collect();
    options.extend(store.list()?);
    Ok(options)
}
