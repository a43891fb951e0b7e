use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::llm::{LlmConfig, LlmProvider};
use crate::triage::TriageConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub tracker: TrackerConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub triage: TriageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

/// Database configuration (agent request/response records)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("triage.db")
}

/// Issue tracker (Jira) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Tracker base URL (e.g., "https://acme.atlassian.net")
    pub url: String,
    /// Project whose open tickets form the triage corpus
    pub project_key: String,
    /// Account used for basic auth
    pub username: String,
    /// API token (can reference env var with ${VAR_NAME})
    pub api_token: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_tracker_timeout")]
    pub timeout_secs: u32,
    /// Maximum tickets fetched per corpus search (default: 1000)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Retries for transient failures (default: 2)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Link type name used when relating tickets (default: "Relates")
    #[serde(default = "default_link_type")]
    pub link_type: String,
}

fn default_tracker_timeout() -> u32 {
    30
}

fn default_max_results() -> u32 {
    1000
}

fn default_max_retries() -> u32 {
    2
}

fn default_link_type() -> String {
    "Relates".to_string()
}

/// Locations of the static prompt documents
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptsConfig {
    #[serde(default = "default_system_prompts")]
    pub system_prompts: PathBuf,
    #[serde(default = "default_examples")]
    pub examples: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system_prompts: default_system_prompts(),
            examples: default_examples(),
        }
    }
}

fn default_system_prompts() -> PathBuf {
    PathBuf::from("prompts/system_prompts.json")
}

fn default_examples() -> PathBuf {
    PathBuf::from("prompts/example_prompts.json")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tracker: SanitizedTrackerConfig,
    pub llm: SanitizedLlmConfig,
    pub prompts: PromptsConfig,
    pub triage: TriageConfig,
}

/// Sanitized tracker config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTrackerConfig {
    pub url: String,
    pub project_key: String,
    pub username_configured: bool,
    pub api_token_configured: bool,
    pub timeout_secs: u32,
    pub max_results: u32,
    pub max_retries: u32,
    pub link_type: String,
}

/// Sanitized LLM config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub max_tokens: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            tracker: SanitizedTrackerConfig {
                url: config.tracker.url.clone(),
                project_key: config.tracker.project_key.clone(),
                username_configured: !config.tracker.username.is_empty(),
                api_token_configured: !config.tracker.api_token.is_empty(),
                timeout_secs: config.tracker.timeout_secs,
                max_results: config.tracker.max_results,
                max_retries: config.tracker.max_retries,
                link_type: config.tracker.link_type.clone(),
            },
            llm: SanitizedLlmConfig {
                provider: config.llm.provider.clone(),
                model: config.llm.model.clone(),
                api_base: config.llm.api_base.clone(),
                api_key_configured: config
                    .llm
                    .api_key
                    .as_ref()
                    .map(|k| !k.is_empty())
                    .unwrap_or(false),
                timeout_secs: config.llm.timeout_secs,
                max_tokens: config.llm.max_tokens,
            },
            prompts: config.prompts.clone(),
            triage: config.triage.clone(),
        }
    }
}
