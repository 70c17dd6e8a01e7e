//! # Director Orchestrator
//!
//! Drives one persona update: resolve the persona, short-circuit repeated or empty
//! instructions, otherwise call the LLM, validate and merge its answer, assemble the
//! final prompts and persist the new record.
//!
//! - **Version**: 1.2.1
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.1: Per-persona locks are dropped once no call holds them
//! - 1.2.0: Per-persona lock serialises concurrent calls on the same file
//! - 1.1.0: Identical repeated instructions return the cached prompts without an LLM call
//! - 1.0.0: Initial release

use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::merge::{assemble, merge};
use super::parser::{excerpt, parse};
use crate::core::{Config, DirectorError, DirectorResult, QualityTags};
use crate::features::llm::{
    ApiOverrides, CompletionClient, CompletionRequest, CredentialResolver, FinishReason,
};
use crate::features::personas::{PersonaStore, PromptBuilder, Resolution, Selector};
use crate::features::templates::{TemplateChoice, TemplateLibrary};

/// Sampling temperature for every round-trip
pub const TEMPERATURE: f32 = 0.5;

/// Characters of raw output kept in an unparsable-response error
pub const DIAGNOSTIC_EXCERPT_CHARS: usize = 200;

/// Inputs of one `generate_prompt` call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub selector: Selector,
    /// Name used by the creation selectors
    pub new_name: String,
    /// Description for a new persona, or the change to apply to an existing one
    pub instruction: String,
    pub template: TemplateChoice,
    pub overrides: ApiOverrides,
}

/// Final prompts plus the merged state as pretty JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOutput {
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub debug_state: String,
}

impl PromptOutput {
    pub fn into_tuple(self) -> (String, String, String) {
        (self.positive_prompt, self.negative_prompt, self.debug_state)
    }
}

/// Orchestrates persona resolution, the LLM round-trip and persistence
pub struct Director {
    store: PersonaStore,
    templates: TemplateLibrary,
    credentials: CredentialResolver,
    client: Arc<dyn CompletionClient>,
    quality_tags: QualityTags,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Director {
    pub fn new(
        store: PersonaStore,
        templates: TemplateLibrary,
        credentials: CredentialResolver,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            store,
            templates,
            credentials,
            client,
            quality_tags: QualityTags::default(),
            locks: DashMap::new(),
        }
    }

    pub fn from_config(config: &Config, client: Arc<dyn CompletionClient>) -> Self {
        Self::new(
            PersonaStore::new(&config.persona_dir),
            TemplateLibrary::new(&config.templates_dir),
            CredentialResolver::new(&config.credentials_path),
            client,
        )
        .with_quality_tags(config.quality_tags.clone())
    }

    pub fn with_quality_tags(mut self, quality_tags: QualityTags) -> Self {
        self.quality_tags = quality_tags;
        self
    }

    pub fn store(&self) -> &PersonaStore {
        &self.store
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Produce (positive, negative, debug state) for a persona and instruction.
    ///
    /// Resolution errors are returned as-is. Anything that fails after
    /// resolution comes back wrapped in `DirectorError::LlmApi`, and the
    /// persona file is left exactly as it was.
    pub async fn generate_prompt(&self, request: &GenerateRequest) -> DirectorResult<PromptOutput> {
        let filename = PersonaStore::target_filename(&request.selector, &request.new_name);
        let lock = self.lock_for(&filename);
        let result = {
            let _guard = lock.lock().await;
            self.generate_locked(request).await
        };
        drop(lock);
        self.release_lock(&filename);
        result
    }

    async fn generate_locked(&self, request: &GenerateRequest) -> DirectorResult<PromptOutput> {
        let resolution = self.store.resolve(&request.selector, &request.new_name)?;

        if let Some(output) = short_circuit(&resolution, &request.instruction) {
            info!("Instruction unchanged for {}, returning cached prompts", resolution.filename);
            return Ok(output);
        }

        self.round_trip(&resolution, request).await.map_err(|e| {
            error!("API Failed for {}: {e}", resolution.filename);
            e.wrap()
        })
    }

    /// Shared lock for one persona file
    fn lock_for(&self, filename: &str) -> Arc<Mutex<()>> {
        self.locks.entry(filename.to_string()).or_default().clone()
    }

    /// Forget the lock when the map holds the only reference
    fn release_lock(&self, filename: &str) {
        self.locks
            .remove_if(filename, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn round_trip(
        &self,
        resolution: &Resolution,
        request: &GenerateRequest,
    ) -> DirectorResult<PromptOutput> {
        let credentials = self.credentials.resolve(&request.overrides)?;
        let system = self.templates.system_prompt(&request.template)?;
        let user = PromptBuilder::new(&request.instruction)
            .for_resolution(&resolution.record.updated_state, resolution.is_new_creation)
            .build();

        info!(
            "Requesting {} of {} from {}",
            if resolution.is_new_creation { "creation" } else { "update" },
            resolution.filename,
            credentials.model_name
        );

        let completion = self
            .client
            .complete(CompletionRequest {
                credentials,
                system,
                user,
                temperature: TEMPERATURE,
                json_mode: true,
            })
            .await?;

        match completion.finish_reason {
            FinishReason::Length => return Err(DirectorError::TruncatedOutput),
            FinishReason::ContentFilter => return Err(DirectorError::Refused),
            FinishReason::Stop | FinishReason::Other(_) => {}
        }

        let parsed = parse(&completion.text).ok_or_else(|| {
            DirectorError::UnparsableResponse(excerpt(&completion.text, DIAGNOSTIC_EXCERPT_CHARS))
        })?;

        let update = merge(&parsed, &resolution.record.updated_state)?;
        let (positive_prompt, negative_prompt) = assemble(
            &self.quality_tags,
            &update.positive_prompt,
            &update.negative_prompt,
        );
        debug!("Assembled positive prompt: {positive_prompt}");

        self.store.save(
            &resolution.filename,
            &update.state,
            &positive_prompt,
            &negative_prompt,
            &request.instruction,
        )?;

        Ok(PromptOutput {
            positive_prompt,
            negative_prompt,
            debug_state: update.state.to_pretty_json(),
        })
    }
}

/// Cached output when the instruction is blank or identical to the last one
fn short_circuit(resolution: &Resolution, instruction: &str) -> Option<PromptOutput> {
    let record = &resolution.record;
    let unchanged = record.last_instruction() == Some(instruction);
    if !instruction.trim().is_empty() && !unchanged {
        return None;
    }

    let (positive_prompt, negative_prompt) = record.cached_prompts();
    Some(PromptOutput {
        positive_prompt,
        negative_prompt,
        debug_state: record.updated_state.to_pretty_json(),
    })
}
