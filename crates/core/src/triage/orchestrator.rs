//! Triage orchestration.
//!
//! One run walks a ticket through:
//!
//! ```text
//! Start -> CorpusFetched -> LinksDispatched -> LinksComplete -> MetadataGenerated -> Done
//!   |            |                 |
//!   +-> Aborted <+                 +-> Cancelled
//! ```
//!
//! Relatedness checks fan out over a bounded pool and are fully joined
//! before metadata synthesis starts. Nothing here returns an error: every
//! outcome is reported through [`TriageReport`].

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::metrics::{COMMENTS, LINKS, RELATEDNESS_CHECKS, TRIAGE_DURATION, TRIAGE_RUNS};
use crate::tracker::{Ticket, TicketClient, TicketCorpus};

use super::config::TriageConfig;
use super::metadata::{MetadataSynthesizer, TriageMetadata};
use super::relatedness::RelatednessClassifier;

/// Link type used when none is configured.
pub const DEFAULT_LINK_TYPE: &str = "Relates";

pub const MSG_NO_TICKETS: &str = "No tickets found for triage";
pub const MSG_COMPLETE: &str = "Task complete";

/// Where a triage run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageState {
    Start,
    CorpusFetched,
    LinksDispatched,
    LinksComplete,
    MetadataGenerated,
    Done,
    Aborted,
    Cancelled,
}

impl TriageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageState::Start => "start",
            TriageState::CorpusFetched => "corpus_fetched",
            TriageState::LinksDispatched => "links_dispatched",
            TriageState::LinksComplete => "links_complete",
            TriageState::MetadataGenerated => "metadata_generated",
            TriageState::Done => "done",
            TriageState::Aborted => "aborted",
            TriageState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TriageState::Done | TriageState::Aborted | TriageState::Cancelled
        )
    }
}

/// Outcome of a single triage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    pub run_id: Uuid,
    pub ticket: String,
    pub final_state: TriageState,
    /// Relatedness checks dispatched (corpus size minus the target).
    pub checks_dispatched: usize,
    pub links_created: usize,
    /// Links the tracker refused or failed to create.
    pub link_failures: usize,
    pub comment_posted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TriageMetadata>,
    /// Status string handed back to callers.
    pub message: String,
}

impl TriageReport {
    fn new(run_id: Uuid, ticket: &str) -> Self {
        Self {
            run_id,
            ticket: ticket.to_string(),
            final_state: TriageState::Start,
            checks_dispatched: 0,
            links_created: 0,
            link_failures: 0,
            comment_posted: false,
            metadata: None,
            message: String::new(),
        }
    }

    fn finish(mut self, state: TriageState, message: impl Into<String>) -> Self {
        self.final_state = state;
        self.message = message.into();
        self
    }

    /// One-line description including counts.
    pub fn summary(&self) -> String {
        if self.final_state != TriageState::Done {
            return self.message.clone();
        }
        format!(
            "{}: {} checked, {} linked, {} link failures, comment {}",
            self.message,
            self.checks_dispatched,
            self.links_created,
            self.link_failures,
            if self.comment_posted { "posted" } else { "not posted" }
        )
    }
}

/// Result of one relatedness worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckOutcome {
    Unrelated,
    Linked,
    LinkFailed,
    Cancelled,
}

/// Drives triage runs. Built once at startup and shared by `Arc`.
pub struct TriageOrchestrator {
    classifier: RelatednessClassifier,
    synthesizer: MetadataSynthesizer,
    tickets: Arc<dyn TicketClient>,
    link_type: String,
    max_workers: usize,
}

impl std::fmt::Debug for TriageOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageOrchestrator")
            .field("project", &self.tickets.project_key())
            .field("link_type", &self.link_type)
            .field("max_workers", &self.max_workers)
            .finish()
    }
}

impl TriageOrchestrator {
    pub fn new(
        classifier: RelatednessClassifier,
        synthesizer: MetadataSynthesizer,
        tickets: Arc<dyn TicketClient>,
        config: &TriageConfig,
    ) -> Self {
        Self {
            classifier,
            synthesizer,
            tickets,
            link_type: DEFAULT_LINK_TYPE.to_string(),
            max_workers: config.effective_workers(),
        }
    }

    pub fn with_link_type(mut self, link_type: impl Into<String>) -> Self {
        self.link_type = link_type.into();
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn tickets(&self) -> &Arc<dyn TicketClient> {
        &self.tickets
    }

    /// Triage a ticket and return only the status message.
    pub async fn triage(&self, key: &str) -> String {
        self.run(key, CancellationToken::new()).await.message
    }

    /// Triage a ticket. Cancelling `cancel` stops pending relatedness checks
    /// and skips the metadata phase.
    pub async fn run(&self, key: &str, cancel: CancellationToken) -> TriageReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("triage", %run_id, ticket = %key);
        let start = Instant::now();

        let report = self
            .run_inner(TriageReport::new(run_id, key), cancel)
            .instrument(span)
            .await;

        let state = report.final_state.as_str();
        TRIAGE_RUNS.with_label_values(&[state]).inc();
        TRIAGE_DURATION
            .with_label_values(&[state])
            .observe(start.elapsed().as_secs_f64());

        report
    }

    async fn run_inner(&self, mut report: TriageReport, cancel: CancellationToken) -> TriageReport {
        info!("Starting triage");
        let key = report.ticket.clone();

        let corpus = match self.fetch_corpus().await {
            Some(corpus) => corpus,
            None => {
                warn!("{}", MSG_NO_TICKETS);
                return report.finish(TriageState::Aborted, MSG_NO_TICKETS);
            }
        };

        let target = match self.tickets.get_ticket(&key).await {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return abort_unknown_ticket(report, &key),
            Err(e) => {
                error!(error = %e, "Failed to fetch target ticket");
                return abort_unknown_ticket(report, &key);
            }
        };
        debug!(corpus = corpus.len(), "Corpus fetched");

        let outcomes = self.link_related(&target, &corpus, &cancel).await;
        report.checks_dispatched = outcomes.len();
        report.links_created = outcomes
            .iter()
            .filter(|o| **o == CheckOutcome::Linked)
            .count();
        report.link_failures = outcomes
            .iter()
            .filter(|o| **o == CheckOutcome::LinkFailed)
            .count();
        debug!(
            checks = report.checks_dispatched,
            linked = report.links_created,
            link_failures = report.link_failures,
            "Link phase complete"
        );

        if cancel.is_cancelled() {
            info!("Triage cancelled during link phase");
            COMMENTS.with_label_values(&["skipped"]).inc();
            return report.finish(
                TriageState::Cancelled,
                format!("Triage cancelled for ticket: {}", key),
            );
        }

        match self.synthesizer.synthesize(&target.text).await {
            Some(metadata) => {
                debug!(priority = %metadata.priority, "Metadata generated");
                report.comment_posted = self.post_comment(&target.key, &metadata).await;
                report.metadata = Some(metadata);
            }
            None => {
                warn!("Metadata synthesis produced no output, skipping comment");
                COMMENTS.with_label_values(&["skipped"]).inc();
            }
        }

        info!(
            linked = report.links_created,
            link_failures = report.link_failures,
            comment_posted = report.comment_posted,
            "Triage completed"
        );
        report.finish(TriageState::Done, MSG_COMPLETE)
    }

    /// Open tickets of the configured project; `None` when there are none
    /// or the tracker could not be searched.
    async fn fetch_corpus(&self) -> Option<TicketCorpus> {
        let project = self.tickets.project_key();
        match self.tickets.search_open_tickets(project).await {
            Ok(corpus) if !corpus.is_empty() => Some(corpus),
            Ok(_) => None,
            Err(e) => {
                error!(project, error = %e, "Failed to search open tickets");
                None
            }
        }
    }

    async fn link_related(
        &self,
        target: &Ticket,
        corpus: &TicketCorpus,
        cancel: &CancellationToken,
    ) -> Vec<CheckOutcome> {
        let candidates: Vec<(String, String)> = corpus
            .iter()
            .filter(|(candidate, _)| !candidate.eq_ignore_ascii_case(&target.key))
            .map(|(candidate, text)| (candidate.clone(), text.clone()))
            .collect();

        debug!(
            candidates = candidates.len(),
            workers = self.max_workers,
            "Dispatching relatedness checks"
        );

        stream::iter(candidates)
            .map(|(candidate, text)| async move {
                self.check_and_link(target, &candidate, &text, cancel).await
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await
    }

    async fn check_and_link(
        &self,
        target: &Ticket,
        candidate: &str,
        candidate_text: &str,
        cancel: &CancellationToken,
    ) -> CheckOutcome {
        let related = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                RELATEDNESS_CHECKS.with_label_values(&["cancelled"]).inc();
                return CheckOutcome::Cancelled;
            }
            related = self.classifier.is_related(&target.text, candidate_text) => related,
        };

        if !related {
            RELATEDNESS_CHECKS.with_label_values(&["unrelated"]).inc();
            return CheckOutcome::Unrelated;
        }
        RELATEDNESS_CHECKS.with_label_values(&["related"]).inc();

        match self
            .tickets
            .link(&target.key, candidate, &self.link_type)
            .await
        {
            Ok(true) => {
                LINKS.with_label_values(&["created"]).inc();
                info!(candidate, "Linked related ticket");
                CheckOutcome::Linked
            }
            Ok(false) => {
                LINKS.with_label_values(&["rejected"]).inc();
                warn!(candidate, "Tracker did not create link");
                CheckOutcome::LinkFailed
            }
            Err(e) => {
                LINKS.with_label_values(&["error"]).inc();
                error!(candidate, error = %e, "Failed to link ticket");
                CheckOutcome::LinkFailed
            }
        }
    }

    async fn post_comment(&self, key: &str, metadata: &TriageMetadata) -> bool {
        match self.tickets.add_comment(key, &metadata.to_comment()).await {
            Ok(true) => {
                COMMENTS.with_label_values(&["posted"]).inc();
                true
            }
            Ok(false) => {
                COMMENTS.with_label_values(&["rejected"]).inc();
                warn!("Tracker did not create metadata comment");
                false
            }
            Err(e) => {
                COMMENTS.with_label_values(&["error"]).inc();
                error!(error = %e, "Failed to post metadata comment");
                false
            }
        }
    }
}

fn abort_unknown_ticket(report: TriageReport, key: &str) -> TriageReport {
    let message = format!("Could not retrieve data for ticket: {}", key);
    error!("{}", message);
    report.finish(TriageState::Aborted, message)
}
