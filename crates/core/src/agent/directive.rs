//! Rule-based agent runtime.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, info};

use super::tool::{ToolRegistry, TRIAGE_TOOL};
use super::{AgentError, AgentOutput, AgentRuntime, AgentStep};

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\btriage\s+(?:ticket\s+)?["'`]?([a-z][a-z0-9]+-\d+)\b"#).unwrap()
});

/// Answers requests of the form `triage <KEY>` by calling the triage tool.
///
/// The verb is matched case-insensitively anywhere in the request, so
/// "Please triage proj-12 for me" works. Everything else is rejected.
#[derive(Debug, Clone)]
pub struct DirectiveAgent {
    tools: ToolRegistry,
}

impl DirectiveAgent {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Ticket key named by a triage directive, uppercased.
    pub fn parse_directive(input: &str) -> Option<String> {
        let caps = DIRECTIVE.captures(input)?;
        Some(caps.get(1)?.as_str().to_uppercase())
    }
}

#[async_trait]
impl AgentRuntime for DirectiveAgent {
    fn name(&self) -> &str {
        "directive"
    }

    async fn invoke(&self, input: &str) -> Result<AgentOutput, AgentError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AgentError::EmptyRequest);
        }

        let Some(key) = Self::parse_directive(input) else {
            debug!(request = %input, "No directive recognised");
            return Err(AgentError::Unsupported(
                "expected an instruction like \"triage PROJ-123\"".to_string(),
            ));
        };

        let tool = self
            .tools
            .get(TRIAGE_TOOL)
            .ok_or_else(|| AgentError::ToolNotFound(TRIAGE_TOOL.to_string()))?;

        info!(ticket = %key, "Dispatching triage directive");
        let observation = tool.call(&key).await;

        Ok(AgentOutput {
            output: observation.clone(),
            steps: vec![AgentStep {
                tool: TRIAGE_TOOL.to_string(),
                input: key,
                observation,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Tool;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingTool {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            TRIAGE_TOOL
        }

        fn description(&self) -> &str {
            "records input"
        }

        async fn call(&self, input: &str) -> String {
            self.inputs.lock().unwrap().push(input.to_string());
            "Task complete".to_string()
        }
    }

    #[test]
    fn test_parse_directive() {
        assert_eq!(
            DirectiveAgent::parse_directive("triage PROJ-12"),
            Some("PROJ-12".to_string())
        );
        assert_eq!(
            DirectiveAgent::parse_directive("Please TRIAGE ticket proj-7 today"),
            Some("PROJ-7".to_string())
        );
        assert_eq!(
            DirectiveAgent::parse_directive("triage \"AB2-99\""),
            Some("AB2-99".to_string())
        );
        assert_eq!(DirectiveAgent::parse_directive("triage everything"), None);
        assert_eq!(DirectiveAgent::parse_directive("what is PROJ-1?"), None);
        assert_eq!(DirectiveAgent::parse_directive("retriage PROJ-1"), None);
    }

    #[test]
    fn test_directive_pattern_is_shared_across_calls() {
        Lazy::force(&DIRECTIVE);
        for i in 1..=50 {
            assert_eq!(
                DirectiveAgent::parse_directive(&format!("triage proj-{}", i)),
                Some(format!("PROJ-{}", i))
            );
        }
        assert_eq!(DirectiveAgent::parse_directive("triage"), None);
    }

    #[tokio::test]
    async fn test_invoke_calls_triage_tool() {
        let tool = Arc::new(RecordingTool::default());
        let mut registry = ToolRegistry::new();
        registry.register(tool.clone());
        let agent = DirectiveAgent::new(registry);

        let output = agent.invoke("triage proj-3").await.unwrap();

        assert_eq!(output.output, "Task complete");
        assert_eq!(output.steps.len(), 1);
        assert_eq!(output.steps[0].input, "PROJ-3");
        assert_eq!(*tool.inputs.lock().unwrap(), vec!["PROJ-3".to_string()]);
    }

    #[tokio::test]
    async fn test_invoke_rejects_other_requests() {
        let agent = DirectiveAgent::new(ToolRegistry::new());

        assert!(matches!(
            agent.invoke("summarise the backlog").await,
            Err(AgentError::Unsupported(_))
        ));
        assert!(matches!(
            agent.invoke("   ").await,
            Err(AgentError::EmptyRequest)
        ));
    }

    #[tokio::test]
    async fn test_invoke_without_triage_tool() {
        let agent = DirectiveAgent::new(ToolRegistry::new());
        assert!(matches!(
            agent.invoke("triage PROJ-1").await,
            Err(AgentError::ToolNotFound(_))
        ));
    }
}
