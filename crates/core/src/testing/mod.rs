//! Testing utilities and mock implementations.
//!
//! Mocks for the two external seams, the LLM and the issue tracker, so the
//! whole triage pipeline can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use triage_core::testing::{MockLlmClient, MockTicketClient};
//!
//! let llm = MockLlmClient::with_default_response("<related>False<related>");
//! llm.respond_when(|prompt| prompt.contains("login"), "<related>True<related>");
//!
//! let tickets = MockTicketClient::new("PROJ");
//! tickets.add_ticket("PROJ-1", "Login fails on Safari");
//! ```

mod mock_llm;
mod mock_tracker;

pub use mock_llm::MockLlmClient;
pub use mock_tracker::{MockTicketClient, RecordedComment, RecordedLink};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::llm::FewShotExample;
    use crate::prompts::PromptLibrary;

    /// Relatedness output the classifier reads as "related".
    pub const RELATED: &str = "<related>True<related>";
    /// Relatedness output the classifier reads as "unrelated".
    pub const UNRELATED: &str = "<related>False<related>";

    /// Metadata output with all four tags.
    pub fn metadata_output(priority: &str) -> String {
        format!(
            "<user_stories>As a user I want it fixed<user_stories>\n\
             <acceptance_criteria>It works<acceptance_criteria>\n\
             <priority>{}<priority>\n\
             <thought>Seems important<thought>",
            priority
        )
    }

    /// A small prompt library with one example per task.
    pub fn prompt_library() -> PromptLibrary {
        PromptLibrary {
            linking_system: "Decide whether two tickets are related.".to_string(),
            linking_examples: vec![FewShotExample {
                input: "<ticket1>Login broken<ticket1><ticket2>Cannot sign in<ticket2>"
                    .to_string(),
                output: RELATED.to_string(),
            }],
            product_system: "You are a product manager.".to_string(),
            product_examples: vec![FewShotExample {
                input: "<description>Login broken<description>".to_string(),
                output: metadata_output("High"),
            }],
        }
    }
}
