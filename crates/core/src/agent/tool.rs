//! Tools callable by an agent runtime.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::triage::TriageOrchestrator;

/// Name the triage tool is registered under.
pub const TRIAGE_TOOL: &str = "triage";

/// A named capability with a text-in, text-out contract.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Shown to runtimes that pick tools from descriptions.
    fn description(&self) -> &str;

    /// Run the tool. Failures are reported in the returned text.
    async fn call(&self, input: &str) -> String;
}

/// Tools by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        self.tools.insert(tool.name().to_string(), tool)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Exposes [`TriageOrchestrator::triage`] as a tool taking a ticket key.
pub struct TriageTool {
    orchestrator: Arc<TriageOrchestrator>,
}

impl TriageTool {
    pub fn new(orchestrator: Arc<TriageOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Agents tend to quote arguments; strip that before using it as a key.
    pub fn normalize_key(input: &str) -> String {
        input
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .trim()
            .to_string()
    }
}

#[async_trait]
impl Tool for TriageTool {
    fn name(&self) -> &str {
        TRIAGE_TOOL
    }

    fn description(&self) -> &str {
        "Triage a ticket: link related open tickets and post user stories, \
         acceptance criteria and priority as a comment. Input is the ticket key."
    }

    async fn call(&self, input: &str) -> String {
        let key = Self::normalize_key(input);
        info!(ticket = %key, "Triage tool invoked");
        self.orchestrator.triage(&key).await
    }
}
