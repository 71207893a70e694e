//! Storage module for persisting scraped entities
//!
//! A single SQLite database holds every entity table. All writes funnel
//! through [`ForumStore`], whose upserts are keyed by each entity's natural
//! key (site-assigned id, composite pair for join tables, content hash or
//! URL for images), so re-running a scrape never duplicates rows.

mod schema;
mod store;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use store::ForumStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What an upsert did with the candidate record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was new and has been inserted
    Inserted,
    /// The record existed and all fields were overwritten
    Updated,
    /// The record existed and was left untouched
    Unchanged,
}

/// Re-scrape policy when a record already exists
///
/// The default is [`InsertMode::Skip`]: the first-scraped version of an
/// entity wins and later sightings are ignored. `--update` switches every
/// upsert to overwrite mode instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertMode {
    #[default]
    Skip,
    Update,
}

/// Row counts per entity table, for the end-of-run summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveCounts {
    pub users: u64,
    pub categories: u64,
    pub boards: u64,
    pub moderators: u64,
    pub threads: u64,
    pub posts: u64,
    pub polls: u64,
    pub poll_options: u64,
    pub poll_voters: u64,
    pub images: u64,
    pub avatars: u64,
    pub shoutbox_posts: u64,
}

impl ArchiveCounts {
    /// Total rows across all entity tables
    pub fn total(&self) -> u64 {
        self.users
            + self.categories
            + self.boards
            + self.moderators
            + self.threads
            + self.posts
            + self.polls
            + self.poll_options
            + self.poll_voters
            + self.images
            + self.avatars
            + self.shoutbox_posts
    }
}
