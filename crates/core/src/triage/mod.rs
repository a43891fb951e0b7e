//! The triage pipeline: relatedness fan-out, linking and the metadata comment.

mod config;
mod metadata;
mod orchestrator;
mod relatedness;

pub use config::TriageConfig;
pub use metadata::{MetadataSynthesizer, TriageMetadata};
pub use orchestrator::{
    TriageOrchestrator, TriageReport, TriageState, DEFAULT_LINK_TYPE, MSG_COMPLETE, MSG_NO_TICKETS,
};
pub use relatedness::RelatednessClassifier;
