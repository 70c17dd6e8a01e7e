// Core layer - configuration, errors and tag handling
pub mod core;

// Features layer - personas, templates, LLM client and the director
pub mod features;

pub use core::{normalize, Config, DirectorError, DirectorResult, QualityTags};

pub use features::{
    // Director
    Director, GenerateRequest, PromptOutput,
    // LLM
    ApiOverrides, CompletionClient, CredentialResolver, OpenAiClient,
    // Personas
    PersonaRecord, PersonaState, PersonaStore, Selector, Slot,
    // Templates
    PromptTemplate, TemplateChoice, TemplateLibrary,
};
