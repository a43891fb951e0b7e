//! Mock ticket tracker for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::tracker::{Ticket, TicketClient, TicketCorpus, TrackerError};

/// A link creation request seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLink {
    pub primary: String,
    pub secondary: String,
    pub relation: String,
}

/// A comment posted through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedComment {
    pub key: String,
    pub text: String,
}

/// In-memory implementation of the TicketClient trait.
///
/// Every link and comment attempt is recorded, including ones the mock
/// was told to fail, so tests can assert on what the pipeline tried to do.
pub struct MockTicketClient {
    project: String,
    tickets: Mutex<HashMap<String, String>>,
    aliases: Mutex<HashMap<String, String>>,
    links: Mutex<Vec<RecordedLink>>,
    comments: Mutex<Vec<RecordedComment>>,
    failing_links: Mutex<HashSet<String>>,
    fail_search: AtomicBool,
    fail_get: AtomicBool,
    reject_comments: AtomicBool,
    connected: AtomicBool,
}

impl std::fmt::Debug for MockTicketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTicketClient")
            .field("project", &self.project)
            .field("tickets", &self.tickets.lock().unwrap().len())
            .finish()
    }
}

impl MockTicketClient {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            tickets: Mutex::new(HashMap::new()),
            aliases: Mutex::new(HashMap::new()),
            links: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            failing_links: Mutex::new(HashSet::new()),
            fail_search: AtomicBool::new(false),
            fail_get: AtomicBool::new(false),
            reject_comments: AtomicBool::new(false),
            connected: AtomicBool::new(true),
        }
    }

    /// Add an open ticket to the corpus.
    pub fn add_ticket(&self, key: &str, text: &str) {
        self.tickets
            .lock()
            .unwrap()
            .insert(key.to_string(), text.to_string());
    }

    /// Let `get_ticket(alias)` resolve to `key`, the way the tracker accepts
    /// issue ids and answers with the canonical key.
    pub fn add_alias(&self, alias: &str, key: &str) {
        self.aliases
            .lock()
            .unwrap()
            .insert(alias.to_string(), key.to_string());
    }

    /// Make `link(_, secondary, _)` fail with a server error.
    pub fn fail_link_to(&self, secondary: &str) {
        self.failing_links
            .lock()
            .unwrap()
            .insert(secondary.to_string());
    }

    pub fn fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    /// Make `add_comment` return `Ok(false)`.
    pub fn reject_comments(&self, reject: bool) {
        self.reject_comments.store(reject, Ordering::SeqCst);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn links(&self) -> Vec<RecordedLink> {
        self.links.lock().unwrap().clone()
    }

    /// Secondary keys of recorded links, sorted.
    pub fn linked_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.secondary.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn comments(&self) -> Vec<RecordedComment> {
        self.comments.lock().unwrap().clone()
    }
}

fn unavailable() -> TrackerError {
    TrackerError::Api {
        status: 503,
        message: "mock tracker unavailable".to_string(),
    }
}

#[async_trait]
impl TicketClient for MockTicketClient {
    fn project_key(&self) -> &str {
        &self.project
    }

    async fn search_open_tickets(&self, _project: &str) -> Result<TicketCorpus, TrackerError> {
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.tickets.lock().unwrap().clone())
    }

    async fn get_ticket(&self, key: &str) -> Result<Option<Ticket>, TrackerError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let key = self
            .aliases
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string());
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .get(&key)
            .map(|text| Ticket::new(key.clone(), text.clone())))
    }

    async fn link(
        &self,
        primary: &str,
        secondary: &str,
        relation: &str,
    ) -> Result<bool, TrackerError> {
        self.links.lock().unwrap().push(RecordedLink {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            relation: relation.to_string(),
        });

        if self.failing_links.lock().unwrap().contains(secondary) {
            return Err(unavailable());
        }
        Ok(true)
    }

    async fn add_comment(&self, key: &str, text: &str) -> Result<bool, TrackerError> {
        self.comments.lock().unwrap().push(RecordedComment {
            key: key.to_string(),
            text: text.to_string(),
        });
        Ok(!self.reject_comments.load(Ordering::SeqCst))
    }

    async fn check_connection(&self) -> Result<(), TrackerError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TrackerError::Api {
                status: 401,
                message: "mock credentials rejected".to_string(),
            })
        }
    }
}
