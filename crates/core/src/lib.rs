pub mod agent;
pub mod config;
pub mod llm;
pub mod metrics;
pub mod prompts;
pub mod records;
pub mod tags;
pub mod testing;
pub mod tracker;
pub mod triage;

pub use agent::{
    AgentError, AgentOutput, AgentRuntime, AgentStep, DirectiveAgent, Tool, ToolRegistry,
    TriageTool,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use llm::{
    create_llm_client, FewShotExample, FewShotTask, LlmClient, LlmConfig, LlmError, LlmProvider,
};
pub use prompts::PromptLibrary;
pub use records::{AgentRecord, RecordError, RecordStore, RecordSummary, SqliteRecordStore};
pub use tracker::{JiraClient, Ticket, TicketClient, TicketCorpus, TrackerError};
pub use triage::{
    MetadataSynthesizer, RelatednessClassifier, TriageConfig, TriageMetadata, TriageOrchestrator,
    TriageReport, TriageState,
};
