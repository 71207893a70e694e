use serde::Deserialize;

/// Main configuration structure for pb-archive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Request throttling configuration
///
/// Each field may be set to `None` (omitted in the TOML) to disable that
/// part of the throttling independently; disabling all three yields a
/// no-throttling mode suitable for local testing.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Number of requests between long cool-down pauses
    #[serde(rename = "request-threshold")]
    pub request_threshold: Option<u64>,

    /// Delay before every request (milliseconds)
    #[serde(rename = "short-delay-ms")]
    pub short_delay_ms: Option<u64>,

    /// Cool-down delay applied every `request-threshold` requests (milliseconds)
    #[serde(rename = "long-delay-ms")]
    pub long_delay_ms: Option<u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_threshold: Some(25),
            short_delay_ms: Some(500),
            long_delay_ms: Some(20_000),
        }
    }
}

impl RateLimitConfig {
    /// A configuration with all throttling disabled
    pub fn disabled() -> Self {
        Self {
            request_threshold: None,
            short_delay_ms: None,
            long_delay_ms: None,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent string sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for page fetches (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for image downloads (seconds)
    #[serde(rename = "image-timeout-secs", default = "default_image_timeout")]
    pub image_timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!("pb-archive/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_timeout() -> u64 {
    30
}

fn default_image_timeout() -> u64 {
    45
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout(),
            image_timeout_secs: default_image_timeout(),
        }
    }
}

/// Output configuration
///
/// The database file is written to `<out-dir>/forum.db` and image files to
/// `<out-dir>/images/`.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the database and downloaded images
    #[serde(rename = "out-dir", default = "default_out_dir")]
    pub out_dir: String,
}

fn default_out_dir() -> String {
    "site".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

/// Authentication collaborator configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// TOML file containing previously captured session cookies
    #[serde(rename = "cookies-file")]
    pub cookies_file: Option<String>,

    /// External command that logs in and prints session cookies as TOML.
    /// Invoked as `<command> <home-url> <username> <password>`.
    #[serde(rename = "helper-command")]
    pub helper_command: Option<String>,
}

/// JS page renderer collaborator configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderConfig {
    /// External command printing fully-rendered HTML for a URL to stdout.
    /// Invoked as `<command> <url>`; e.g. `chromium --headless --dump-dom`.
    pub command: Option<String>,
}
