//! Issue tracker abstraction.
//!
//! The triage pipeline only ever talks to a [`TicketClient`]. The shipped
//! implementation is [`JiraClient`], which speaks the Jira REST API and
//! owns all retry behaviour for transient failures.

mod jira;
mod types;

pub use jira::JiraClient;
pub use types::*;
