//! Model gateway — uniform interface over the two judge/answer backends.
//!
//! Backend selection is a closed two-variant [`Provider`] enum, so there is
//! no "unsupported model" dispatch failure at runtime.  Every call is a
//! single request with no retry; errors come back as values and are never
//! allowed to escape as panics into the orchestration loop.

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;
use crate::judgment::{self, Judgment, ParseFailure};
use crate::matrix::JUDGE_SYSTEM_PROMPT;

// ─── Provider identity ───────────────────────────────────────────────────────

/// Identity of one of the two contenders in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    OpenAi,
    Anthropic,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A single backend call that did not produce usable text.  Contained at the
/// task level — never fatal to the question or the run.
#[derive(Debug, thiserror::Error)]
pub enum BackendFailure {
    /// Transport-level failure (connect, timeout, body read).
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx reply (auth, rate limit, server error).  Carries a body
    /// excerpt for diagnostics.
    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    /// 2xx reply with no message content.
    #[error("{provider} reply had no message content")]
    EmptyReply { provider: &'static str },
}

/// Why one judging pipeline produced no judgment.
#[derive(Debug, thiserror::Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Backend(#[from] BackendFailure),
    #[error(transparent)]
    Parse(#[from] ParseFailure),
}

// ─── Backend trait ───────────────────────────────────────────────────────────

/// One model service.  Implementations wrap a concrete HTTP API; tests
/// substitute scripted fakes.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Free-form answer to a prompt.
    async fn answer(&self, prompt: &str) -> Result<String, BackendFailure>;

    /// Judging call: the prompt plus a system instruction demanding the
    /// structured judgment schema.  Returns the raw reply text — parsing is
    /// the gateway's job, not the backend's.
    async fn judge(&self, prompt: &str, system: &str) -> Result<String, BackendFailure>;
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Dispatches answer and judging calls to the right backend by [`Provider`].
#[derive(Clone)]
pub struct Gateway {
    openai: Arc<dyn ModelBackend>,
    anthropic: Arc<dyn ModelBackend>,
    openai_name: String,
    anthropic_name: String,
}

impl Gateway {
    /// Build the two real HTTP backends from configuration.  Fails fast on a
    /// missing API key.
    pub fn new(config: &ArenaConfig) -> Result<Self> {
        let openai_key = std::env::var(&config.openai.api_key_env)
            .with_context(|| format!("missing API key env var {}", config.openai.api_key_env))?;
        let anthropic_key = std::env::var(&config.anthropic.api_key_env)
            .with_context(|| format!("missing API key env var {}", config.anthropic.api_key_env))?;

        let openai = openai::OpenAiBackend::new(&config.openai, openai_key)?;
        let anthropic = anthropic::AnthropicBackend::new(&config.anthropic, anthropic_key)?;

        Ok(Self::with_backends(
            Arc::new(openai),
            Arc::new(anthropic),
            config.openai.display_name.clone(),
            config.anthropic.display_name.clone(),
        ))
    }

    /// Assemble a gateway from arbitrary backends.  Used by tests to inject
    /// scripted fakes.
    pub fn with_backends(
        openai: Arc<dyn ModelBackend>,
        anthropic: Arc<dyn ModelBackend>,
        openai_name: String,
        anthropic_name: String,
    ) -> Self {
        Self {
            openai,
            anthropic,
            openai_name,
            anthropic_name,
        }
    }

    /// Display name used in persisted records and the run summary.
    pub fn display_name(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai_name,
            Provider::Anthropic => &self.anthropic_name,
        }
    }

    fn backend(&self, provider: Provider) -> &dyn ModelBackend {
        match provider {
            Provider::OpenAi => self.openai.as_ref(),
            Provider::Anthropic => self.anthropic.as_ref(),
        }
    }

    /// Fetch a model's answer to a question.  Single call, no retry.
    pub async fn fetch_answer(
        &self,
        provider: Provider,
        prompt: &str,
    ) -> Result<String, BackendFailure> {
        self.backend(provider).answer(prompt).await
    }

    /// Run one judging pipeline: judge call with the structured-output
    /// system instruction, then the tolerant parser.  The raw reply is the
    /// same recovery path for both backends.
    pub async fn fetch_judgment(
        &self,
        provider: Provider,
        prompt: &str,
    ) -> Result<Judgment, TaskFailure> {
        let raw = self
            .backend(provider)
            .judge(prompt, JUDGE_SYSTEM_PROMPT)
            .await?;
        Ok(judgment::parse(&raw)?)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Shared reqwest client builder for both backends.  The request timeout is
/// the only guard at the gateway boundary — a hung backend stalls exactly one
/// question's barrier, bounded by this.
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Trim a reply body down to a loggable excerpt.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &body[..cut])
    }
}
