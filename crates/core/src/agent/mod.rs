//! Natural-language entry point.
//!
//! A request is handed to an [`AgentRuntime`], which decides which registered
//! [`Tool`] to call. Triage is exposed to runtimes as the `triage` tool.

mod directive;
mod tool;

pub use directive::DirectiveAgent;
pub use tool::{Tool, ToolRegistry, TriageTool, TRIAGE_TOOL};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from agent runtimes.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("empty request")]
    EmptyRequest,

    #[error("unsupported request: {0}")]
    Unsupported(String),

    #[error("tool not registered: {0}")]
    ToolNotFound(String),
}

/// One tool invocation made while answering a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStep {
    pub tool: String,
    pub input: String,
    pub observation: String,
}

/// Final answer plus the tool calls that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub output: String,
    #[serde(default)]
    pub steps: Vec<AgentStep>,
}

/// Turns a free-form request into tool calls and an answer.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, input: &str) -> Result<AgentOutput, AgentError>;
}
