//! User message construction for persona round-trips
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Update messages carry the current state as pretty JSON
//! - 1.0.0: Consolidated message building into fluent builder API

use super::record::PersonaState;

/// Builder for the user message sent alongside the system prompt
///
/// A new persona gets a creation task; an existing one gets its current
/// state followed by an update task.
///
/// # Example
///
/// ```ignore
/// let message = PromptBuilder::new("give her a red scarf")
///     .with_state(&record.updated_state)
///     .build();
/// ```
pub struct PromptBuilder<'a> {
    instruction: &'a str,
    current_state: Option<&'a PersonaState>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(instruction: &'a str) -> Self {
        Self {
            instruction,
            current_state: None,
        }
    }

    /// Set the state to update. Without one the message asks for a new character.
    pub fn with_state(mut self, state: &'a PersonaState) -> Self {
        self.current_state = Some(state);
        self
    }

    /// Pick creation or update depending on how the persona was resolved
    pub fn for_resolution(self, state: &'a PersonaState, is_new_creation: bool) -> Self {
        if is_new_creation {
            self
        } else {
            self.with_state(state)
        }
    }

    pub fn build(self) -> String {
        match self.current_state {
            None => format!(
                "Task: Create a new character.\nDescription: {}",
                self.instruction
            ),
            Some(state) => format!(
                "Current State JSON:\n{}\n\nTask: Update state based on instruction.\nInstruction: {}",
                state.to_pretty_json(),
                self.instruction
            ),
        }
    }
}
