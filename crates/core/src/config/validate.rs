use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Tracker connection fields are present
/// - LLM credentials are present for hosted providers
/// - Triage worker count is at least 1 when set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let tracker = &config.tracker;
    for (field, value) in [
        ("tracker.url", &tracker.url),
        ("tracker.project_key", &tracker.project_key),
        ("tracker.username", &tracker.username),
        ("tracker.api_token", &tracker.api_token),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
    }

    if config.llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "llm.model cannot be empty".to_string(),
        ));
    }

    if config.llm.provider.requires_api_key()
        && config
            .llm
            .api_key
            .as_ref()
            .map(|k| k.trim().is_empty())
            .unwrap_or(true)
    {
        return Err(ConfigError::ValidationError(format!(
            "llm.api_key is required for provider {:?}",
            config.llm.provider
        )));
    }

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(ConfigError::ValidationError(format!(
            "llm.temperature must be between 0.0 and 2.0, got {}",
            config.llm.temperature
        )));
    }

    if config.triage.max_workers == Some(0) {
        return Err(ConfigError::ValidationError(
            "triage.max_workers must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[tracker]
url = "https://example.atlassian.net"
project_key = "PROJ"
username = "bot@example.com"
api_token = "token"

[llm]
provider = "ollama"
model = "llama3"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_token_fails() {
        let mut config = valid_config();
        config.tracker.api_token = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tracker.api_token"));
    }

    #[test]
    fn test_validate_hosted_provider_needs_key() {
        let mut config = valid_config();
        config.llm.provider = crate::llm::LlmProvider::OpenAi;
        config.llm.api_key = None;
        assert!(validate_config(&config).is_err());

        config.llm.api_key = Some("sk-test".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = valid_config();
        config.triage.max_workers = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
