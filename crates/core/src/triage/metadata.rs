//! Product metadata synthesis for a single ticket.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::llm::FewShotTask;
use crate::tags::{extract_tag_or_default, wrap_tag};

/// Structured output of the metadata task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageMetadata {
    pub user_stories: String,
    pub acceptance_criteria: String,
    pub priority: String,
    pub thought: String,
}

impl TriageMetadata {
    /// Pull the four tags out of raw model output. Missing tags become empty.
    pub fn from_output(output: &str) -> Self {
        Self {
            user_stories: extract_tag_or_default(output, "user_stories"),
            acceptance_criteria: extract_tag_or_default(output, "acceptance_criteria"),
            priority: extract_tag_or_default(output, "priority"),
            thought: extract_tag_or_default(output, "thought"),
        }
    }

    /// Fixed four-line tracker comment.
    pub fn to_comment(&self) -> String {
        format!(
            "user_stories: {}\nacceptance_criteria: {}\npriority: {}\nthought: {}",
            self.user_stories, self.acceptance_criteria, self.priority, self.thought
        )
    }
}

/// Runs the metadata task over a ticket description.
#[derive(Debug, Clone)]
pub struct MetadataSynthesizer {
    task: Arc<FewShotTask>,
}

impl MetadataSynthesizer {
    pub fn new(task: Arc<FewShotTask>) -> Self {
        Self { task }
    }

    pub fn build_prompt(text: &str) -> String {
        wrap_tag(text, "description")
    }

    /// `None` only when the model produced nothing (or the call failed).
    pub async fn synthesize(&self, text: &str) -> Option<TriageMetadata> {
        match self.task.run(&Self::build_prompt(text)).await {
            Ok(Some(output)) => Some(TriageMetadata::from_output(&output)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Metadata synthesis failed");
                None
            }
        }
    }
}
