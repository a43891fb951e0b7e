//! LLM access for the triage pipeline.
//!
//! - [`LlmClient`] abstracts a hosted or local chat model (Anthropic, OpenAI, Ollama)
//! - [`FewShotTask`] pairs a client with a system prompt and example turns
//!
//! Clients are `Send + Sync` and shared behind `Arc`, so one instance serves
//! every concurrent relatedness check.

mod client;
mod config;
mod few_shot;

pub use client::{
    create_llm_client, AnthropicClient, ChatMessage, ChatRole, CompletionRequest,
    CompletionResponse, LlmClient, LlmError, LlmUsage, OllamaClient, OpenAiClient,
};
pub use config::{LlmConfig, LlmProvider};
pub use few_shot::{FewShotExample, FewShotTask};
