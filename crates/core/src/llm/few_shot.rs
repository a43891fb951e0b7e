//! Few-shot prompted LLM tasks.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::client::{ChatMessage, CompletionRequest, LlmClient, LlmError};
use crate::metrics::{LLM_REQUESTS, LLM_REQUEST_DURATION};

/// One worked example shown to the model before the real input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub input: String,
    pub output: String,
}

/// A system prompt plus example turns, bound to a model.
///
/// Immutable once built. The relatedness and metadata tasks are each
/// constructed once at startup and shared by every triage run.
pub struct FewShotTask {
    name: String,
    system_prompt: String,
    examples: Vec<FewShotExample>,
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: f32,
}

impl std::fmt::Debug for FewShotTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FewShotTask")
            .field("name", &self.name)
            .field("examples", &self.examples.len())
            .field("provider", &self.client.provider())
            .field("model", &self.client.model())
            .finish()
    }
}

impl FewShotTask {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        examples: Vec<FewShotExample>,
        client: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            examples,
            client,
            max_tokens: 1024,
            temperature: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn examples(&self) -> &[FewShotExample] {
        &self.examples
    }

    /// Render the system prompt, the examples as alternating turns, then `input`.
    pub fn build_request(&self, input: &str) -> CompletionRequest {
        let history = self
            .examples
            .iter()
            .flat_map(|example| {
                [
                    ChatMessage::user(example.input.clone()),
                    ChatMessage::assistant(example.output.clone()),
                ]
            })
            .collect();

        CompletionRequest::new(input)
            .with_system(self.system_prompt.clone())
            .with_history(history)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }

    /// Run the task. Blank model output is reported as `Ok(None)`.
    pub async fn run(&self, input: &str) -> Result<Option<String>, LlmError> {
        let start = Instant::now();
        let result = self.client.complete(self.build_request(input)).await;

        LLM_REQUEST_DURATION
            .with_label_values(&[&self.name])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                LLM_REQUESTS.with_label_values(&[&self.name, "success"]).inc();
                debug!(
                    task = %self.name,
                    model = %response.model,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM task completed"
                );
                if response.text.trim().is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(response.text))
                }
            }
            Err(e) => {
                LLM_REQUESTS.with_label_values(&[&self.name, "error"]).inc();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;
    use crate::testing::MockLlmClient;

    fn examples() -> Vec<FewShotExample> {
        vec![
            FewShotExample {
                input: "<description>Login broken<description>".to_string(),
                output: "<priority>High<priority>".to_string(),
            },
            FewShotExample {
                input: "<description>Typo in footer<description>".to_string(),
                output: "<priority>Low<priority>".to_string(),
            },
        ]
    }

    #[test]
    fn test_build_request_orders_examples_before_input() {
        let client = Arc::new(MockLlmClient::new());
        let task = FewShotTask::new("metadata", "You triage tickets.", examples(), client);

        let request = task.build_request("<description>Crash on save<description>");

        assert_eq!(request.system.as_deref(), Some("You triage tickets."));
        assert_eq!(request.messages.len(), 5);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.messages[1].content, "<priority>High<priority>");
        assert_eq!(request.messages[3].role, ChatRole::Assistant);
        assert_eq!(request.prompt(), "<description>Crash on save<description>");
        assert_eq!(request.temperature, 0.0);
    }

    #[tokio::test]
    async fn test_run_returns_model_text() {
        let client = Arc::new(MockLlmClient::with_default_response("<related>True<related>"));
        let task = FewShotTask::new("relatedness", "sys", vec![], client.clone());

        let output = task.run("input").await.unwrap();

        assert_eq!(output.as_deref(), Some("<related>True<related>"));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_run_blank_output_is_absent() {
        let client = Arc::new(MockLlmClient::with_default_response("   \n"));
        let task = FewShotTask::new("metadata", "sys", vec![], client);

        assert_eq!(task.run("input").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_run_propagates_client_error() {
        let client = Arc::new(MockLlmClient::new());
        client.fail_when(|_| true);
        let task = FewShotTask::new("metadata", "sys", vec![], client);

        assert!(task.run("input").await.is_err());
    }
}
