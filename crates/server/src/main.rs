use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triage_core::{
    create_llm_client, load_config, validate_config, AgentRuntime, DirectiveAgent, JiraClient,
    MetadataSynthesizer, PromptLibrary, RecordStore, RelatednessClassifier, SqliteRecordStore,
    TicketClient, ToolRegistry, TriageOrchestrator, TriageTool,
};

use triage_server::api::create_router;
use triage_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TRIAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!(
        "Tracker: {} (project {})",
        config.tracker.url, config.tracker.project_key
    );

    // LLM client and the two few-shot tasks
    let llm = create_llm_client(&config.llm).context("Failed to create LLM client")?;
    info!("Using LLM provider {} ({})", llm.provider(), llm.model());

    let prompts = PromptLibrary::from_config(&config.prompts).context("Failed to load prompts")?;
    let relatedness = Arc::new(prompts.relatedness_task(Arc::clone(&llm), &config.llm));
    let metadata = Arc::new(prompts.metadata_task(Arc::clone(&llm), &config.llm));
    info!(
        "Prompt library loaded ({} linking examples, {} product examples)",
        prompts.linking_examples.len(),
        prompts.product_examples.len()
    );

    // Tracker client
    let tickets: Arc<dyn TicketClient> = Arc::new(
        JiraClient::new(&config.tracker).context("Failed to create tracker client")?,
    );

    // Triage orchestrator
    let orchestrator = Arc::new(
        TriageOrchestrator::new(
            RelatednessClassifier::new(relatedness),
            MetadataSynthesizer::new(metadata),
            tickets,
            &config.triage,
        )
        .with_link_type(config.tracker.link_type.clone()),
    );
    info!(
        "Triage orchestrator ready ({} workers)",
        orchestrator.max_workers()
    );

    // Agent with the triage tool registered
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(TriageTool::new(Arc::clone(&orchestrator))));
    let agent: Arc<dyn AgentRuntime> = Arc::new(DirectiveAgent::new(tools));
    info!("Agent runtime: {}", agent.name());

    // Record store
    let records: Arc<dyn RecordStore> = Arc::new(
        SqliteRecordStore::new(&config.database.path).context("Failed to create record store")?,
    );
    info!("Record store initialized");

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, agent, orchestrator, records));
    let shutdown = state.shutdown_token().clone();

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM), then cancel in-flight triage runs.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Server shutting down...");
    shutdown.cancel();
}
