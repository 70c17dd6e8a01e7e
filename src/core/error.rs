//! Error taxonomy for persona resolution, LLM round-trips and persistence
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Added `LlmApi` wrapper and `root()` for matching the wrapped cause
//! - 1.0.0: Initial taxonomy

use thiserror::Error;

/// Errors raised anywhere in the director pipeline
#[derive(Error, Debug)]
pub enum DirectorError {
    /// Selected persona file does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// Persona file exists but could not be read or parsed
    #[error("Read Error: {0}")]
    ReadError(String),

    /// Prompt template (or other JSON configuration) is missing or malformed
    #[error("Config Error: {0}")]
    ConfigError(String),

    /// API URL, key or model name could not be resolved
    #[error("{0}")]
    CredentialError(String),

    #[error("Client Init Error: {0}")]
    ClientInitError(String),

    #[error("LLM output truncated! (Max Tokens reached).")]
    TruncatedOutput,

    #[error("LLM refused to generate (Content Filter).")]
    Refused,

    /// Response text contained no parseable JSON object; carries a diagnostic excerpt
    #[error("Failed to parse LLM Response!\nRaw Content: {0}...")]
    UnparsableResponse(String),

    /// Transport or provider failure from the completion endpoint
    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Failed to save persona: {0}")]
    PersistenceError(String),

    /// Outward-facing wrapper for every failure after resolution
    #[error("LLM API Error: {0}\nPlease check your API Key, Network, or Model Name.")]
    LlmApi(Box<DirectorError>),
}

impl DirectorError {
    /// Wrap an error for the caller, leaving already-wrapped errors untouched
    pub fn wrap(self) -> Self {
        match self {
            DirectorError::LlmApi(_) => self,
            other => DirectorError::LlmApi(Box::new(other)),
        }
    }

    /// The underlying cause, looking through the `LlmApi` wrapper
    pub fn root(&self) -> &DirectorError {
        match self {
            DirectorError::LlmApi(inner) => inner.root(),
            other => other,
        }
    }
}

/// Result type used across the director pipeline
pub type DirectorResult<T> = Result<T, DirectorError>;
