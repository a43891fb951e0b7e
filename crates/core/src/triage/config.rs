//! Triage pipeline configuration.

use serde::{Deserialize, Serialize};

/// Configuration for triage runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Concurrent relatedness checks per run.
    /// Unset means the host's available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
}

impl TriageConfig {
    /// Worker pool size actually used for the fan-out.
    pub fn effective_workers(&self) -> usize {
        self.max_workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_host_parallelism() {
        let config = TriageConfig::default();
        assert!(config.max_workers.is_none());
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn test_deserialize_explicit_workers() {
        let config: TriageConfig = toml::from_str("max_workers = 4").unwrap();
        assert_eq!(config.max_workers, Some(4));
        assert_eq!(config.effective_workers(), 4);
    }
}
