//! pb-archive: a ProBoards forum archiver
//!
//! This crate walks a ProBoards-hosted forum (users, categories, boards,
//! threads, posts, polls, shoutbox, images) and persists everything into a
//! SQLite database with referential integrity, while respecting the site's
//! rate limits.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod model;
pub mod render;
pub mod scrape;
pub mod storage;
pub mod urls;

use thiserror::Error;

/// Main error type for pb-archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Extraction error: {0}")]
    Extract(#[from] scrape::ExtractError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Login failed: {0}")]
    Auth(String),

    #[error("Page renderer error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("Queue closed unexpectedly: {0}")]
    QueueClosed(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Not a recognized forum URL: {0}")]
    Unrecognized(String),

    #[error("Missing numeric id in URL: {0}")]
    MissingId(String),
}

/// Result type alias for pb-archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{Content, User};
pub use scrape::{run_archive, ScrapeSession};
pub use storage::{ForumStore, InsertMode, InsertOutcome};
pub use urls::{split_url, ScrapeTarget};
