//! Triage lifecycle integration tests.
//!
//! These tests drive complete triage runs against mock LLM and tracker
//! clients: corpus fetch -> relatedness fan-out -> links -> metadata comment.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use triage_core::{
    agent::{AgentRuntime, DirectiveAgent, ToolRegistry, TriageTool},
    llm::LlmConfig,
    testing::{fixtures, MockLlmClient, MockTicketClient},
    LlmProvider, MetadataSynthesizer, RelatednessClassifier, TriageConfig, TriageOrchestrator,
    TriageState,
};

/// Test helper wiring an orchestrator to mocks.
struct TestHarness {
    llm: Arc<MockLlmClient>,
    tickets: Arc<MockTicketClient>,
    orchestrator: Arc<TriageOrchestrator>,
}

impl TestHarness {
    fn new(max_workers: usize) -> Self {
        Self::with_metadata_output(max_workers, &fixtures::metadata_output("High"))
    }

    fn with_metadata_output(max_workers: usize, metadata_output: &str) -> Self {
        let llm = Arc::new(MockLlmClient::with_default_response(fixtures::UNRELATED));
        llm.respond_when(|prompt| prompt.starts_with("<description>"), metadata_output);

        let tickets = Arc::new(MockTicketClient::new("PROJ"));

        let library = fixtures::prompt_library();
        let llm_config = LlmConfig {
            provider: LlmProvider::Ollama,
            model: "mock".to_string(),
            api_key: None,
            api_base: None,
            timeout_secs: 5,
            max_tokens: 512,
            temperature: 0.0,
        };
        let relatedness = library.relatedness_task(llm.clone(), &llm_config);
        let metadata = library.metadata_task(llm.clone(), &llm_config);

        let orchestrator = TriageOrchestrator::new(
            RelatednessClassifier::new(Arc::new(relatedness)),
            MetadataSynthesizer::new(Arc::new(metadata)),
            tickets.clone(),
            &TriageConfig {
                max_workers: Some(max_workers),
            },
        );

        Self {
            llm,
            tickets,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Seed the corpus with `count` tickets PROJ-1..=PROJ-count.
    fn seed(&self, count: usize) {
        for i in 1..=count {
            self.tickets
                .add_ticket(&format!("PROJ-{}", i), &format!("Ticket number {}", i));
        }
    }

    /// Mark candidates whose text contains `needle` (any case) as related.
    fn relate(&self, needle: &str) {
        let needle = needle.to_lowercase();
        self.llm.respond_when(
            move |prompt| {
                prompt.starts_with("<ticket1>")
                    && prompt
                        .split("<ticket2>")
                        .nth(1)
                        .is_some_and(|candidate| candidate.to_lowercase().contains(&needle))
            },
            fixtures::RELATED,
        );
    }

    fn relatedness_calls(&self) -> usize {
        self.llm
            .prompts()
            .iter()
            .filter(|p| p.starts_with("<ticket1>"))
            .count()
    }

    fn metadata_calls(&self) -> usize {
        self.llm
            .prompts()
            .iter()
            .filter(|p| p.starts_with("<description>"))
            .count()
    }
}

#[tokio::test]
async fn test_one_check_per_other_ticket() {
    let harness = TestHarness::new(4);
    harness.seed(6);

    let report = harness
        .orchestrator
        .run("PROJ-3", CancellationToken::new())
        .await;

    assert_eq!(report.final_state, TriageState::Done);
    assert_eq!(report.message, "Task complete");
    assert_eq!(report.checks_dispatched, 5);
    assert_eq!(harness.relatedness_calls(), 5);
    assert_eq!(harness.metadata_calls(), 1);

    // The target never appears as a candidate.
    assert!(harness
        .llm
        .prompts()
        .iter()
        .all(|p| !p.contains("<ticket2>Ticket number 3<ticket2>")));
}

#[tokio::test]
async fn test_target_named_by_alias_is_never_linked_to_itself() {
    for requested in ["10003", "proj-3"] {
        let harness = TestHarness::new(4);
        harness.seed(4);
        harness.tickets.add_alias(requested, "PROJ-3");
        harness.llm.set_default_response(fixtures::RELATED);

        let report = harness
            .orchestrator
            .run(requested, CancellationToken::new())
            .await;

        assert_eq!(report.final_state, TriageState::Done, "{}", requested);
        assert_eq!(report.checks_dispatched, 3, "{}", requested);
        assert_eq!(harness.relatedness_calls(), 3, "{}", requested);
        assert_eq!(
            harness.tickets.linked_keys(),
            vec!["PROJ-1", "PROJ-2", "PROJ-4"],
            "{}",
            requested
        );
        assert!(harness
            .tickets
            .links()
            .iter()
            .all(|link| link.primary == "PROJ-3" && link.secondary != "PROJ-3"));
    }
}

#[tokio::test]
async fn test_links_only_related_candidates() {
    let harness = TestHarness::new(3);
    harness.tickets.add_ticket("PROJ-1", "Login fails on Safari");
    harness.tickets.add_ticket("PROJ-2", "Blank page after login");
    harness.tickets.add_ticket("PROJ-3", "Add CSV export");
    harness.tickets.add_ticket("PROJ-4", "Login button misaligned");
    harness.tickets.add_ticket("PROJ-5", "Dark mode for settings");
    harness.relate("login");

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert_eq!(report.links_created, 2);
    assert_eq!(harness.tickets.linked_keys(), vec!["PROJ-2", "PROJ-4"]);
    for link in harness.tickets.links() {
        assert_eq!(link.primary, "PROJ-1");
        assert_eq!(link.relation, "Relates");
    }
}

#[tokio::test]
async fn test_no_link_when_nothing_related() {
    let harness = TestHarness::new(2);
    harness.seed(4);

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert_eq!(report.final_state, TriageState::Done);
    assert_eq!(report.links_created, 0);
    assert!(harness.tickets.links().is_empty());
    assert_eq!(harness.tickets.comments().len(), 1);
}

#[tokio::test]
async fn test_priority_only_metadata_comment() {
    let harness = TestHarness::with_metadata_output(2, "<priority>High<priority>");
    harness.seed(2);

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert!(report.comment_posted);
    let comments = harness.tickets.comments();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].key, "PROJ-1");
    assert_eq!(
        comments[0].text,
        "user_stories: \nacceptance_criteria: \npriority: High\nthought: "
    );
}

#[tokio::test]
async fn test_blank_metadata_skips_comment() {
    let harness = TestHarness::with_metadata_output(2, "");
    harness.seed(3);

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert_eq!(report.final_state, TriageState::Done);
    assert!(report.metadata.is_none());
    assert!(!report.comment_posted);
    assert!(harness.tickets.comments().is_empty());
}

#[tokio::test]
async fn test_empty_corpus_aborts_without_side_effects() {
    let harness = TestHarness::new(2);

    let message = harness.orchestrator.triage("PROJ-1").await;

    assert_eq!(message, "No tickets found for triage");
    assert_eq!(harness.llm.call_count(), 0);
    assert!(harness.tickets.links().is_empty());
    assert!(harness.tickets.comments().is_empty());
}

#[tokio::test]
async fn test_tracker_error_on_target_aborts() {
    let harness = TestHarness::new(2);
    harness.seed(3);
    harness.tickets.fail_get(true);

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert_eq!(report.final_state, TriageState::Aborted);
    assert_eq!(report.message, "Could not retrieve data for ticket: PROJ-1");
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_link_failure_does_not_stop_siblings_or_comment() {
    let harness = TestHarness::new(2);
    harness.tickets.add_ticket("PROJ-1", "Login fails on Safari");
    harness.tickets.add_ticket("PROJ-2", "Login broken again");
    harness.tickets.add_ticket("PROJ-3", "Login page slow");
    harness.relate("Login");
    harness.tickets.fail_link_to("PROJ-2");

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert_eq!(report.final_state, TriageState::Done);
    assert_eq!(report.links_created, 1);
    assert_eq!(report.link_failures, 1);
    assert_eq!(harness.tickets.linked_keys(), vec!["PROJ-2", "PROJ-3"]);
    assert!(report.comment_posted);
    assert_eq!(report.metadata.unwrap().priority, "High");
}

#[tokio::test]
async fn test_llm_failure_counts_as_unrelated() {
    let harness = TestHarness::new(2);
    harness.seed(4);
    harness.relate("Ticket number");
    harness
        .llm
        .fail_when(|p| p.contains("<ticket2>Ticket number 2<ticket2>"));

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert_eq!(report.final_state, TriageState::Done);
    assert_eq!(harness.tickets.linked_keys(), vec!["PROJ-3", "PROJ-4"]);
}

#[tokio::test]
async fn test_fan_out_respects_worker_limit() {
    let harness = TestHarness::new(2);
    harness.seed(7);
    harness.llm.set_delay(Duration::from_millis(20));

    let report = harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    assert_eq!(report.checks_dispatched, 6);
    assert!(harness.llm.max_concurrent_calls() <= 2);
    assert!(harness.llm.max_concurrent_calls() >= 1);
}

#[tokio::test]
async fn test_metadata_waits_for_link_phase() {
    let harness = TestHarness::new(3);
    harness.seed(5);
    harness.llm.set_delay(Duration::from_millis(5));

    harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    let prompts = harness.llm.prompts();
    assert_eq!(prompts.len(), 5);
    assert!(prompts.last().unwrap().starts_with("<description>"));
}

#[tokio::test]
async fn test_cancellation_mid_run() {
    let harness = TestHarness::new(1);
    harness.seed(10);
    harness.llm.set_delay(Duration::from_millis(50));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(75)).await;
        trigger.cancel();
    });

    let report = harness.orchestrator.run("PROJ-1", cancel).await;

    assert_eq!(report.final_state, TriageState::Cancelled);
    assert_eq!(report.checks_dispatched, 9);
    assert!(harness.relatedness_calls() < 9);
    assert_eq!(harness.metadata_calls(), 0);
    assert!(harness.tickets.comments().is_empty());
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let harness = TestHarness::new(2);
    harness.tickets.add_ticket("PROJ-1", "Login fails on Safari");
    harness.tickets.add_ticket("PROJ-2", "Login broken again");
    harness.tickets.add_ticket("PROJ-3", "Export to CSV");
    harness.tickets.add_ticket("PROJ-4", "CSV export misses headers");
    harness.relate("Login");
    harness.relate("CSV");

    let (first, second) = tokio::join!(
        harness.orchestrator.run("PROJ-1", CancellationToken::new()),
        harness.orchestrator.run("PROJ-3", CancellationToken::new()),
    );

    assert_eq!(first.final_state, TriageState::Done);
    assert_eq!(second.final_state, TriageState::Done);
    assert_ne!(first.run_id, second.run_id);

    let mut comment_keys: Vec<String> = harness
        .tickets
        .comments()
        .into_iter()
        .map(|c| c.key)
        .collect();
    comment_keys.sort();
    assert_eq!(comment_keys, vec!["PROJ-1", "PROJ-3"]);
}

#[tokio::test]
async fn test_requests_carry_prompt_library() {
    let harness = TestHarness::new(1);
    harness.seed(2);

    harness
        .orchestrator
        .run("PROJ-1", CancellationToken::new())
        .await;

    let requests = harness.llm.requests();
    let relatedness = requests
        .iter()
        .find(|r| r.prompt().starts_with("<ticket1>"))
        .unwrap();
    assert_eq!(
        relatedness.system.as_deref(),
        Some("Decide whether two tickets are related.")
    );
    // One example exchange plus the real prompt.
    assert_eq!(relatedness.messages.len(), 3);
    assert_eq!(relatedness.max_tokens, 512);
}

#[tokio::test]
async fn test_directive_agent_end_to_end() {
    let harness = TestHarness::new(2);
    harness.tickets.add_ticket("PROJ-1", "Login fails on Safari");
    harness.tickets.add_ticket("PROJ-2", "Login broken again");
    harness.relate("Login");

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(TriageTool::new(harness.orchestrator.clone())));
    let agent = DirectiveAgent::new(tools);

    let output = agent.invoke("Please triage proj-1").await.unwrap();

    assert_eq!(output.output, "Task complete");
    assert_eq!(output.steps[0].input, "PROJ-1");
    assert_eq!(harness.tickets.linked_keys(), vec!["PROJ-2"]);
    assert_eq!(harness.tickets.comments().len(), 1);
}
