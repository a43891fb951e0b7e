use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use triage_core::{AgentRuntime, Config, RecordStore, SanitizedConfig, TriageOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    agent: Arc<dyn AgentRuntime>,
    orchestrator: Arc<TriageOrchestrator>,
    records: Arc<dyn RecordStore>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        agent: Arc<dyn AgentRuntime>,
        orchestrator: Arc<TriageOrchestrator>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            agent,
            orchestrator,
            records,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn agent(&self) -> &dyn AgentRuntime {
        self.agent.as_ref()
    }

    pub fn orchestrator(&self) -> &TriageOrchestrator {
        self.orchestrator.as_ref()
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    /// Cancelled when the server starts shutting down. Triage runs started
    /// over HTTP use a child of this token.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
