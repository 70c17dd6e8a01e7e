//! Chat completion client
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use async_trait::async_trait;
use log::debug;
use openai::chat::{
    ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole, ChatCompletionResponseFormat,
};
use openai::Credentials;

use super::credentials::ApiCredentials;
use crate::core::{DirectorError, DirectorResult};

/// Why the provider stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    /// Hit the token limit; output is incomplete
    Length,
    /// Provider refused the content
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn parse(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub credentials: ApiCredentials,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Ask the provider for a JSON object response
    pub json_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub finish_reason: FinishReason,
}

/// Black-box LLM completion: (system, user) in, text and finish reason out.
/// Implementations must not retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> DirectorResult<Completion>;
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Default)]
pub struct OpenAiClient;

impl OpenAiClient {
    pub fn new() -> Self {
        Self
    }

    fn credentials(creds: &ApiCredentials) -> DirectorResult<Credentials> {
        let url = creds.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DirectorError::ClientInitError(format!(
                "invalid API URL '{url}'"
            )));
        }
        let base_url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        Ok(Credentials::new(creds.api_key.clone(), base_url))
    }
}

fn message(role: ChatCompletionMessageRole, content: String) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Some(content),
        name: None,
        function_call: None,
        tool_call_id: None,
        tool_calls: None,
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> DirectorResult<Completion> {
        let credentials = Self::credentials(&request.credentials)?;
        let messages = vec![
            message(ChatCompletionMessageRole::System, request.system),
            message(ChatCompletionMessageRole::User, request.user),
        ];

        debug!(
            "Sending chat completion to {} (model {})",
            request.credentials.api_url, request.credentials.model_name
        );

        let mut builder = ChatCompletion::builder(&request.credentials.model_name, messages)
            .credentials(credentials)
            .temperature(request.temperature);
        if request.json_mode {
            builder = builder.response_format(ChatCompletionResponseFormat::json_object());
        }

        let completion = builder
            .create()
            .await
            .map_err(|e| DirectorError::Completion(e.to_string()))?;

        let choice = completion
            .choices
            .first()
            .ok_or_else(|| DirectorError::Completion("response contained no choices".to_string()))?;

        Ok(Completion {
            text: choice.message.content.clone().unwrap_or_default(),
            finish_reason: FinishReason::parse(&choice.finish_reason),
        })
    }
}
