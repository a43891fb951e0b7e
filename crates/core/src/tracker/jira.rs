//! Jira REST API client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::metrics::TRACKER_REQUESTS;

use super::{Ticket, TicketClient, TicketCorpus, TrackerError};

/// Jira client using basic auth (account email + API token).
pub struct JiraClient {
    client: Client,
    base_url: String,
    project_key: String,
    username: String,
    api_token: String,
    max_results: u32,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("project_key", &self.project_key)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl JiraClient {
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| TrackerError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            project_key: config.project_key.clone(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
            max_results: config.max_results,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Base delay between retries; attempt `n` waits `n * delay`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn search_url(&self, project: &str) -> String {
        let jql = format!("project={} AND resolution=unresolved", project);
        self.url(&format!(
            "/rest/api/2/search?jql={}&maxResults={}",
            urlencoding::encode(&jql),
            self.max_results
        ))
    }

    /// Send a request, retrying transient failures with linear backoff.
    ///
    /// Non-transient error statuses are returned as a response so callers
    /// can give them operation-specific meaning (404 on fetch, for instance).
    async fn send<F>(&self, operation: &str, build: F) -> Result<Response, TrackerError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = build()
                .basic_auth(&self.username, Some(&self.api_token))
                .send()
                .await
                .map_err(map_send_error);

            let outcome = match result {
                Ok(response) if is_transient_status(response.status()) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    Err(api_error(status, &body))
                }
                other => other,
            };

            match outcome {
                Ok(response) => {
                    TRACKER_REQUESTS
                        .with_label_values(&[operation, "success"])
                        .inc();
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Transient tracker failure, retrying"
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
                Err(e) => {
                    TRACKER_REQUESTS
                        .with_label_values(&[operation, "error"])
                        .inc();
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl TicketClient for JiraClient {
    fn project_key(&self) -> &str {
        &self.project_key
    }

    async fn search_open_tickets(&self, project: &str) -> Result<TicketCorpus, TrackerError> {
        let url = self.search_url(project);
        debug!(project, "Searching open tickets");

        let response = self.send("search", || self.client.get(&url)).await?;
        let response = ensure_success(response).await?;
        let page: SearchResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::Parse(e.to_string()))?;

        let mut corpus = TicketCorpus::with_capacity(page.issues.len());
        for issue in page.issues {
            match issue.into_ticket() {
                Some(ticket) => {
                    corpus.insert(ticket.key, ticket.text);
                }
                None => warn!(project, "Skipping issue without a key"),
            }
        }

        debug!(project, tickets = corpus.len(), "Open tickets fetched");
        Ok(corpus)
    }

    async fn get_ticket(&self, key: &str) -> Result<Option<Ticket>, TrackerError> {
        let url = self.url(&format!(
            "/rest/agile/1.0/issue/{}",
            urlencoding::encode(key)
        ));

        let response = self.send("get", || self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(key, "Ticket not found");
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        let issue: Issue = response
            .json()
            .await
            .map_err(|e| TrackerError::Parse(e.to_string()))?;

        // Callers may pass an issue id or a differently cased key.
        let canonical = issue.key.as_deref().filter(|k| !k.is_empty()).unwrap_or(key);
        let summary = issue.fields.summary.as_deref();
        let description = issue.fields.description.as_deref();
        Ok(Some(Ticket::from_fields(canonical, summary, description)))
    }

    async fn link(
        &self,
        primary: &str,
        secondary: &str,
        relation: &str,
    ) -> Result<bool, TrackerError> {
        let url = self.url("/rest/api/2/issueLink");
        let body = json!({
            "inwardIssue": { "key": primary },
            "outwardIssue": { "key": secondary },
            "type": { "name": relation },
        });

        let response = self
            .send("link", || self.client.post(&url).json(&body))
            .await?;
        created(response).await
    }

    async fn add_comment(&self, key: &str, text: &str) -> Result<bool, TrackerError> {
        let url = self.url(&format!(
            "/rest/api/2/issue/{}/comment",
            urlencoding::encode(key)
        ));
        let body = json!({ "body": text });

        let response = self
            .send("comment", || self.client.post(&url).json(&body))
            .await?;
        created(response).await
    }

    async fn check_connection(&self) -> Result<(), TrackerError> {
        let url = self.url("/rest/api/2/myself");
        let response = self.send("check", || self.client.get(&url)).await?;
        ensure_success(response).await.map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl Issue {
    fn into_ticket(self) -> Option<Ticket> {
        let key = self.key.filter(|k| !k.is_empty())?;
        Some(Ticket::from_fields(
            key,
            self.fields.summary.as_deref(),
            self.fields.description.as_deref(),
        ))
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn map_send_error(e: reqwest::Error) -> TrackerError {
    if e.is_timeout() {
        TrackerError::Timeout
    } else {
        TrackerError::Http(e.to_string())
    }
}

fn api_error(status: StatusCode, body: &str) -> TrackerError {
    TrackerError::Api {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    }
}

async fn ensure_success(response: Response) -> Result<Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(api_error(status, &body))
}

/// 201 means created; any other success status is a refusal.
async fn created(response: Response) -> Result<bool, TrackerError> {
    let response = ensure_success(response).await?;
    Ok(response.status() == StatusCode::CREATED)
}
