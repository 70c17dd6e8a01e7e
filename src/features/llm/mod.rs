//! # Feature: LLM Client
//!
//! Credential resolution and the chat completion collaborator used by the director.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Completion behind the `CompletionClient` trait so callers can swap providers
//! - 1.0.0: Initial release

pub mod client;
pub mod credentials;

pub use client::{Completion, CompletionClient, CompletionRequest, FinishReason, OpenAiClient};
pub use credentials::{ApiCredentials, ApiOverrides, CredentialResolver};
