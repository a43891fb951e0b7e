//! LLM configuration types.

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Anthropic Claude API.
    Anthropic,
    /// OpenAI API, or any endpoint speaking the chat completions protocol.
    OpenAi,
    /// Local Ollama instance.
    Ollama,
}

impl LlmProvider {
    /// Returns true if this provider refuses unauthenticated requests.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, LlmProvider::Anthropic | LlmProvider::OpenAi)
    }
}

/// LLM client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider.
    pub provider: LlmProvider,
    /// Model name/identifier.
    pub model: String,
    /// API key (can reference env var with ${VAR_NAME}).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Maximum tokens for completions.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature. Triage wants deterministic answers.
    #[serde(default)]
    pub temperature: f32,
}

fn default_timeout() -> u32 {
    60
}

fn default_max_tokens() -> u32 {
    1024
}
