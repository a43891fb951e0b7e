//! Pairwise relatedness classification.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::FewShotTask;
use crate::tags::{extract_tag, wrap_tag};

/// Tag the model answers in.
const RELATED_TAG: &str = "related";

/// Asks the relatedness task whether two tickets describe related work.
#[derive(Debug, Clone)]
pub struct RelatednessClassifier {
    task: Arc<FewShotTask>,
}

impl RelatednessClassifier {
    pub fn new(task: Arc<FewShotTask>) -> Self {
        Self { task }
    }

    /// Render the comparison prompt for two ticket texts.
    pub fn build_prompt(primary: &str, candidate: &str) -> String {
        format!(
            "{}{}",
            wrap_tag(primary, "ticket1"),
            wrap_tag(candidate, "ticket2")
        )
    }

    /// True only when the model answers exactly `True`.
    ///
    /// LLM failures and unparseable output count as unrelated.
    pub async fn is_related(&self, primary: &str, candidate: &str) -> bool {
        let prompt = Self::build_prompt(primary, candidate);

        let output = match self.task.run(&prompt).await {
            Ok(Some(output)) => output,
            Ok(None) => {
                debug!("Relatedness task returned no output");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Relatedness check failed");
                return false;
            }
        };

        match extract_tag(&output, RELATED_TAG) {
            Some(verdict) => verdict == "True",
            None => {
                warn!(output = %output, "No <related> tag in relatedness output");
                false
            }
        }
    }
}
