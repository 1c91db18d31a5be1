//! Anthropic messages backend.
//!
//! Speaks `POST {base_url}/v1/messages` with the `x-api-key` header and the
//! pinned `anthropic-version`.  The system instruction travels as a
//! top-level field, not as a message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{excerpt, BackendFailure, ModelBackend};
use crate::config::BackendConfig;

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

/// Seconds before an in-flight request is abandoned.
const HTTP_TIMEOUT_SECS: u64 = 120;

pub struct AnthropicBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl AnthropicBackend {
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
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| BackendFailure::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body: format!("undecodable reply ({e}): {}", excerpt(&body)),
            })?;

        let content = parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BackendFailure::EmptyReply { provider: PROVIDER })?;

        debug!(model = %self.model, reply_len = content.len(), "message reply received");
        Ok(content)
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    async fn answer(&self, prompt: &str) -> Result<String, BackendFailure> {
        self.complete(prompt, None).await
    }

    async fn judge(&self, prompt: &str, system: &str) -> Result<String, BackendFailure> {
        self.complete(prompt, Some(system)).await
    }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}
