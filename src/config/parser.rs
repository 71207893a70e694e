use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pb_archive::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Out dir: {}", config.output.out_dir);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so an archive can be traced back to the exact
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[rate-limit]
request-threshold = 10
short-delay-ms = 100
long-delay-ms = 5000

[http]
user-agent = "TestArchiver/1.0"

[output]
out-dir = "./archive"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.rate_limit.request_threshold, Some(10));
        assert_eq!(config.rate_limit.short_delay_ms, Some(100));
        assert_eq!(config.http.user_agent, "TestArchiver/1.0");
        assert_eq!(config.output.out_dir, "./archive");
    }

    #[test]
    fn test_omitted_sections_get_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.rate_limit.request_threshold, Some(25));
        assert_eq!(config.http.page_timeout_secs, 30);
        assert_eq!(config.output.out_dir, "site");
        assert!(config.auth.cookies_file.is_none());
    }

    #[test]
    fn test_omitted_delay_disables_it() {
        let config_content = r#"
[rate-limit]
short-delay-ms = 250
"#;
        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.rate_limit.short_delay_ms, Some(250));
        assert_eq!(config.rate_limit.request_threshold, None);
        assert_eq!(config.rate_limit.long_delay_ms, None);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config_content = r#"
[rate-limit]
request-threshold = 0
"#;
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }
}
