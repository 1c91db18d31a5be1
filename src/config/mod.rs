//! Run configuration — `config.toml` with per-backend sections, overridable
//! from the CLI.  Every field has a default so an empty (or absent) file is
//! a valid configuration; only the API keys are mandatory, and those come
//! from the environment, never from the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_DISPLAY_NAME: &str = "GPT-4";
const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_ANTHROPIC_DISPLAY_NAME: &str = "Claude3";
const DEFAULT_ANTHROPIC_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_QUESTION_COUNT: usize = 20;

// ─── BackendConfig ───────────────────────────────────────────────────────────

/// One model backend (`[openai]` / `[anthropic]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Model identifier sent to the API.
    pub model: String,
    /// Name used in persisted records and the run summary.
    pub display_name: String,
    /// API base URL.  Override to point at a proxy, a self-hosted gateway,
    /// or a scripted test server.
    pub base_url: String,
    /// Environment variable holding the API key.  The key itself never
    /// appears in config.toml.
    pub api_key_env: String,
    /// Maximum tokens per reply.
    pub max_tokens: u32,
}

impl BackendConfig {
    fn openai_default() -> Self {
        Self {
            model: DEFAULT_OPENAI_MODEL.to_string(),
            display_name: DEFAULT_OPENAI_DISPLAY_NAME.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key_env: DEFAULT_OPENAI_KEY_ENV.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    fn anthropic_default() -> Self {
        Self {
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            display_name: DEFAULT_ANTHROPIC_DISPLAY_NAME.to_string(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            api_key_env: DEFAULT_ANTHROPIC_KEY_ENV.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

// ─── RunConfig ───────────────────────────────────────────────────────────────

/// Batch settings (`[run]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// JSON file with the question batch — an array of `{"question": …}`
    /// objects.
    pub questions_file: PathBuf,
    /// How many questions from the top of the file to evaluate.
    pub question_count: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            questions_file: PathBuf::from("questions.json"),
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

// ─── ArenaConfig ─────────────────────────────────────────────────────────────

/// Top-level configuration for one evaluation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub openai: BackendConfig,
    pub anthropic: BackendConfig,
    pub run: RunConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            openai: BackendConfig::openai_default(),
            anthropic: BackendConfig::anthropic_default(),
            run: RunConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the path is `None` or the file does not exist.  A present-but-broken
    /// file is an error rather than a silent fallback.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
