//! Mock LLM client for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

type PromptPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Mock implementation of the LlmClient trait.
///
/// Provides controllable behavior for testing:
/// - A default response for every prompt
/// - Scripted responses chosen by a predicate on the prompt
/// - Injected failures
/// - Recorded requests and peak concurrency
pub struct MockLlmClient {
    default_response: Mutex<String>,
    scripted: Mutex<Vec<(PromptPredicate, String)>>,
    failures: Mutex<Vec<PromptPredicate>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl std::fmt::Debug for MockLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLlmClient")
            .field("calls", &self.call_count())
            .finish()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    /// A client that answers every prompt with an empty string.
    pub fn new() -> Self {
        Self {
            default_response: Mutex::new(String::new()),
            scripted: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_default_response(response: &str) -> Self {
        let client = Self::new();
        client.set_default_response(response);
        client
    }

    pub fn set_default_response(&self, response: &str) {
        *self.default_response.lock().unwrap() = response.to_string();
    }

    /// Answer prompts matching `predicate` with `response`. First match wins.
    pub fn respond_when<F>(&self, predicate: F, response: &str)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.scripted
            .lock()
            .unwrap()
            .push((Box::new(predicate), response.to_string()));
    }

    /// Fail prompts matching `predicate` with an API error.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.failures.lock().unwrap().push(Box::new(predicate));
    }

    /// Sleep this long inside every call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Final user prompt of every call, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt().to_string())
            .collect()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Highest number of calls observed running at once.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn response_for(&self, prompt: &str) -> Result<String, LlmError> {
        if self.failures.lock().unwrap().iter().any(|p| p(prompt)) {
            return Err(LlmError::Api {
                status: 500,
                message: "mock failure".to_string(),
            });
        }

        let scripted = self.scripted.lock().unwrap();
        let response = scripted
            .iter()
            .find(|(predicate, _)| predicate(prompt))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.lock().unwrap().clone());
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request.prompt().to_string();
        self.requests.lock().unwrap().push(request);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.response_for(&prompt);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result.map(|text| CompletionResponse {
            text,
            usage: LlmUsage::default(),
            model: "mock-model".to_string(),
        })
    }
}
