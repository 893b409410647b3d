//! Script generation via an OpenAI-style chat-completions service.
//!
//! The generator is intentionally simple — one long-lived HTTP client, one
//! fixed prompt template, one completion per request. Routing the result
//! (and absorbing failures into a user-visible fallback) is the engine's
//! job, not the generator's.

use crate::error::{GenerateError, Result};
use crate::{ContentType, Language};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const GENERATION_MODEL: &str = "gpt-4o-mini";

/// A 45-second script fits comfortably; the cap keeps a runaway completion
/// from ballooning latency and spend.
const MAX_COMPLETION_TOKENS: u32 = 1024;

/// Bounded so a hung upstream turns into a failure reply instead of a
/// stuck conversation.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Capability trait for the script-generation collaborator.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Produce a ready-to-send script for the selected content type and
    /// language. One-shot request/response; no conversation state.
    async fn generate(&self, content_type: ContentType, language: Language) -> Result<String>;
}

/// OpenAI chat-completions implementation of [`ScriptGenerator`].
pub struct OpenAiGenerator {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(GENERATION_TIMEOUT)
            .build()
            .map_err(GenerateError::Http)?;

        Ok(Self {
            http,
            api_key,
            base_url: OPENAI_CHAT_COMPLETIONS_URL.to_owned(),
        })
    }
}

#[async_trait]
impl ScriptGenerator for OpenAiGenerator {
    async fn generate(&self, content_type: ContentType, language: Language) -> Result<String> {
        let request = ChatCompletionRequest {
            model: GENERATION_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(content_type, language),
            }],
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(GenerateError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(GenerateError::Http)?;
        extract_completion(completion)
    }
}

fn build_prompt(content_type: ContentType, language: Language) -> String {
    format!("Write a 45-second script for {content_type} in {language}, with a hook and hashtags.")
}

/// Pull the first choice's text out of a completion response. Blank output
/// counts as a failure so the user never receives an empty message.
fn extract_completion(completion: ChatCompletionResponse) -> Result<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_owned())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| GenerateError::EmptyCompletion.into())
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
