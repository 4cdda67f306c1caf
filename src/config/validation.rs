use crate::config::types::{Config, FetcherConfig, HarvestConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl target and pacing
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.namespaces.is_empty() {
        return Err(ConfigError::Validation(
            "at least one namespace is required".to_string(),
        ));
    }

    for namespace in &config.namespaces {
        validate_namespace(namespace)?;
    }

    if !config.delay.is_finite() || config.delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay must be a non-negative number of seconds, got {}",
            config.delay
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// A namespace is a single URL path segment
fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    let trimmed = namespace.trim().trim_matches('/');

    if trimmed.is_empty() {
        return Err(ConfigError::Validation(
            "namespace cannot be empty".to_string(),
        ));
    }

    if trimmed.contains('/') || trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "namespace must be a single path segment without spaces, got '{}'",
            namespace
        )));
    }

    // "." and ".." would resolve to the site root and escape the output tree
    if trimmed.chars().all(|c| c == '.') || trimmed.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "namespace must name a path segment, got '{}'",
            namespace
        )));
    }

    Ok(())
}

/// Validates transport settings
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if let Some(user_agent) = &config.user_agent {
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be empty when set".to_string(),
            ));
        }
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetcherKind, OutputFormat};
    use std::path::PathBuf;

    fn create_test_config() -> Config {
        Config {
            harvest: HarvestConfig {
                base_url: "https://www.example.com".to_string(),
                namespaces: vec!["Land-Rover".to_string()],
                delay: 1.4,
                max_pages: None,
            },
            fetcher: FetcherConfig {
                kind: FetcherKind::Http,
                ..FetcherConfig::default()
            },
            output: OutputConfig {
                directory: PathBuf::from("./out"),
                formats: vec![OutputFormat::Jsonl],
                database_path: None,
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&create_test_config()).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = create_test_config();
        config.harvest.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.harvest.base_url = "ftp://example.com".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_namespace_rules() {
        let mut config = create_test_config();
        config.harvest.namespaces = vec!["Land Rover".to_string()];
        assert!(validate(&config).is_err());

        config.harvest.namespaces = vec!["Land-Rover/Defender".to_string()];
        assert!(validate(&config).is_err());

        config.harvest.namespaces = vec!["/".to_string()];
        assert!(validate(&config).is_err());

        config.harvest.namespaces = vec!["/Land-Rover/".to_string()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_dot_namespaces_rejected() {
        let mut config = create_test_config();
        for namespace in [".", "..", "/../", "..."] {
            config.harvest.namespaces = vec![namespace.to_string()];
            assert!(
                matches!(validate(&config), Err(ConfigError::Validation(_))),
                "{} should be rejected",
                namespace
            );
        }

        config.harvest.namespaces = vec![r"..\Jaguar".to_string()];
        assert!(validate(&config).is_err());

        config.harvest.namespaces = vec!["Mercedes-Benz.AMG".to_string()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_negative_delay() {
        let mut config = create_test_config();
        config.harvest.delay = -1.0;
        assert!(validate(&config).is_err());

        config.harvest.delay = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_pages() {
        let mut config = create_test_config();
        config.harvest.max_pages = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_attempts() {
        let mut config = create_test_config();
        config.fetcher.max_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_proxy() {
        let mut config = create_test_config();
        config.fetcher.proxy = Some("::nope".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_no_formats() {
        let mut config = create_test_config();
        config.output.formats.clear();
        assert!(validate(&config).is_err());
    }
}
