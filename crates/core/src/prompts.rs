//! Static prompt documents for the two triage LLM tasks.
//!
//! Two JSON files are read once at startup:
//!
//! ```text
//! system_prompts.json   {"system_prompt_product": "...", "system_prompt_linking": "..."}
//! example_prompts.json  {"examples_product": [{"input": "...", "output": "..."}],
//!                        "examples_linking": [...]}
//! ```
//!
//! Anything missing here is a startup failure, never a per-call one.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::config::{ConfigError, PromptsConfig};
use crate::llm::{FewShotExample, FewShotTask, LlmClient, LlmConfig};

/// Task name used for metrics and logs of the relatedness pass.
pub const RELATEDNESS_TASK: &str = "relatedness";
/// Task name used for metrics and logs of the metadata pass.
pub const METADATA_TASK: &str = "metadata";

#[derive(Debug, Deserialize)]
struct SystemPrompts {
    #[serde(default)]
    system_prompt_product: Option<String>,
    #[serde(default)]
    system_prompt_linking: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExamplePrompts {
    #[serde(default)]
    examples_product: Vec<FewShotExample>,
    #[serde(default)]
    examples_linking: Vec<FewShotExample>,
}

/// Validated prompt material for both triage tasks.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    pub linking_system: String,
    pub linking_examples: Vec<FewShotExample>,
    pub product_system: String,
    pub product_examples: Vec<FewShotExample>,
}

impl PromptLibrary {
    /// Load using the paths from configuration.
    pub fn from_config(config: &PromptsConfig) -> Result<Self, ConfigError> {
        Self::load(&config.system_prompts, &config.examples)
    }

    /// Load and validate both documents.
    pub fn load(system_path: &Path, examples_path: &Path) -> Result<Self, ConfigError> {
        let system_json = read_document(system_path)?;
        let examples_json = read_document(examples_path)?;
        Self::from_json(&system_json, &examples_json)
    }

    /// Parse both documents from strings (useful for testing).
    pub fn from_json(system_json: &str, examples_json: &str) -> Result<Self, ConfigError> {
        let system: SystemPrompts = serde_json::from_str(system_json)
            .map_err(|e| ConfigError::ParseError(format!("system prompts: {}", e)))?;
        let examples: ExamplePrompts = serde_json::from_str(examples_json)
            .map_err(|e| ConfigError::ParseError(format!("example prompts: {}", e)))?;

        Ok(Self {
            linking_system: required(system.system_prompt_linking, "system_prompt_linking")?,
            linking_examples: examples.examples_linking,
            product_system: required(system.system_prompt_product, "system_prompt_product")?,
            product_examples: examples.examples_product,
        })
    }

    /// Build the task that decides whether two tickets are related.
    pub fn relatedness_task(&self, client: Arc<dyn LlmClient>, llm: &LlmConfig) -> FewShotTask {
        FewShotTask::new(
            RELATEDNESS_TASK,
            self.linking_system.clone(),
            self.linking_examples.clone(),
            client,
        )
        .with_max_tokens(llm.max_tokens)
        .with_temperature(llm.temperature)
    }

    /// Build the task that writes user stories, acceptance criteria and priority.
    pub fn metadata_task(&self, client: Arc<dyn LlmClient>, llm: &LlmConfig) -> FewShotTask {
        FewShotTask::new(
            METADATA_TASK,
            self.product_system.clone(),
            self.product_examples.clone(),
            client,
        )
        .with_max_tokens(llm.max_tokens)
        .with_temperature(llm.temperature)
    }
}

fn read_document(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::ValidationError(format!(
            "{} is missing or empty",
            field
        ))),
    }
}
