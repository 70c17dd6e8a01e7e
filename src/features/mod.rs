//! # Features Layer
//!
//! - **personas**: persona records and the file-backed store
//! - **templates**: JSON system-prompt templates
//! - **llm**: credentials and the chat completion client
//! - **director**: the orchestrator tying them together

pub mod director;
pub mod llm;
pub mod personas;
pub mod templates;

pub use director::{Director, GenerateRequest, PromptOutput};
pub use llm::{ApiOverrides, CompletionClient, CredentialResolver, OpenAiClient};
pub use personas::{PersonaRecord, PersonaState, PersonaStore, Selector, Slot};
pub use templates::{PromptTemplate, TemplateChoice, TemplateLibrary};
