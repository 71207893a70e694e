use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Rejects values that would make the archiver misbehave silently: a zero
/// request threshold (division by zero in the limiter), a zero page timeout,
/// and an empty user agent or output directory.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.rate_limit.request_threshold == Some(0) {
        return Err(ConfigError::Validation(
            "rate-limit.request-threshold must be at least 1".to_string(),
        ));
    }

    if config.http.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.page-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.http.image_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.image-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "http.user-agent must not be empty".to_string(),
        ));
    }

    if config.output.out_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.out-dir must not be empty".to_string(),
        ));
    }

    Ok(())
}
