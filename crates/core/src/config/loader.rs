use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRIAGE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    resolve_env_refs(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    resolve_env_refs(config)
}

/// Replace `${NAME}` secret references with the value of the named variable.
fn resolve_env_refs(mut config: Config) -> Result<Config, ConfigError> {
    config.tracker.api_token = resolve_value(&config.tracker.api_token)?;
    config.tracker.username = resolve_value(&config.tracker.username)?;
    if let Some(api_key) = config.llm.api_key.take() {
        config.llm.api_key = Some(resolve_value(&api_key)?);
    }
    Ok(config)
}

fn resolve_value(value: &str) -> Result<String, ConfigError> {
    match value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(name) => {
            std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
        }
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[tracker]
url = "https://example.atlassian.net"
project_key = "PROJ"
username = "bot@example.com"
api_token = "token"

[llm]
provider = "open_ai"
model = "gpt-4o-mini"
api_key = "sk-test"
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.tracker.project_key, "PROJ");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_config_from_str_missing_tracker() {
        let toml = r#"
[llm]
provider = "ollama"
model = "llama3"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            "{}\n[server]\nhost = \"127.0.0.1\"\nport = 3000\n",
            MINIMAL
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_env_reference_resolved() {
        std::env::set_var("TRIAGE_TEST_TOKEN_RESOLVED", "from-env");
        let toml = MINIMAL.replace(
            "api_token = \"token\"",
            "api_token = \"${TRIAGE_TEST_TOKEN_RESOLVED}\"",
        );
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(config.tracker.api_token, "from-env");
    }

    #[test]
    fn test_env_reference_missing_fails() {
        let toml = MINIMAL.replace(
            "api_key = \"sk-test\"",
            "api_key = \"${TRIAGE_TEST_DEFINITELY_UNSET}\"",
        );
        let result = load_config_from_str(&toml);
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(name)) if name == "TRIAGE_TEST_DEFINITELY_UNSET"
        ));
    }
}
