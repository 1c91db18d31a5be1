//! OpenAI-style chat-completions backend.
//!
//! Speaks `POST {base_url}/chat/completions` with a bearer token.  The
//! `base_url` is configurable so tests and self-hosted OpenAI-compatible
//! gateways can be pointed at directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{excerpt, BackendFailure, ModelBackend};
use crate::config::BackendConfig;

const PROVIDER: &str = "openai";

/// Seconds before an in-flight request is abandoned.
const HTTP_TIMEOUT_SECS: u64 = 120;

pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::build_client(HTTP_TIMEOUT_SECS)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        })
    }

    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, BackendFailure> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| BackendFailure::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| BackendFailure::Transport {
                provider: PROVIDER,
                source,
            })?;

        if !status.is_success() {
            return Err(BackendFailure::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| BackendFailure::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body: format!("undecodable reply ({e}): {}", excerpt(&body)),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BackendFailure::EmptyReply { provider: PROVIDER })?;

        debug!(model = %self.model, reply_len = content.len(), "chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    async fn answer(&self, prompt: &str) -> Result<String, BackendFailure> {
        self.complete(prompt, None).await
    }

    async fn judge(&self, prompt: &str, system: &str) -> Result<String, BackendFailure> {
        self.complete(prompt, Some(system)).await
    }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
