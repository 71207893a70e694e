//! Database schema definitions
//!
//! All entity tables are keyed by the site-assigned id; join tables carry a
//! composite uniqueness constraint instead. `user_id` columns deliberately
//! have no FOREIGN KEY clause: a single-board or single-thread scrape
//! references users that were never collected, and moderator lists may name
//! users whose profiles come later in the run.

/// SQL schema for the archive database
pub const SCHEMA_SQL: &str = r#"
-- One row per scrape invocation, for provenance
CREATE TABLE IF NOT EXISTS archive_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT
);

-- Registered users (positive ids) and guests (negative ids)
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT,
    username TEXT,
    user_group TEXT,
    date_registered TEXT,
    last_online TEXT,
    age INTEGER,
    birthdate TEXT,
    email TEXT,
    gender TEXT,
    location TEXT,
    latest_status TEXT,
    instant_messengers TEXT,
    signature TEXT,
    post_count INTEGER,
    website TEXT,
    website_url TEXT,
    url TEXT
);

CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS boards (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    category_id INTEGER REFERENCES categories(id),
    parent_id INTEGER REFERENCES boards(id),
    password_protected INTEGER NOT NULL DEFAULT 0,
    url TEXT
);

CREATE INDEX IF NOT EXISTS idx_boards_parent ON boards(parent_id);

CREATE TABLE IF NOT EXISTS moderators (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    board_id INTEGER NOT NULL REFERENCES boards(id),
    user_id INTEGER NOT NULL,
    UNIQUE(board_id, user_id)
);

-- board_id has no FOREIGN KEY so a single-thread scrape can reference a
-- board that was never collected
CREATE TABLE IF NOT EXISTS threads (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    board_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    locked INTEGER NOT NULL DEFAULT 0,
    sticky INTEGER NOT NULL DEFAULT 0,
    announcement INTEGER NOT NULL DEFAULT 0,
    views INTEGER,
    url TEXT
);

CREATE INDEX IF NOT EXISTS idx_threads_board ON threads(board_id);

CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY,
    thread_id INTEGER NOT NULL REFERENCES threads(id),
    user_id INTEGER NOT NULL,
    date TEXT,
    message TEXT NOT NULL,
    last_edited TEXT,
    edit_user_id INTEGER,
    url TEXT
);

CREATE INDEX IF NOT EXISTS idx_posts_thread ON posts(thread_id);
CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id);

-- A poll shares its owning thread's id (1:1)
CREATE TABLE IF NOT EXISTS polls (
    id INTEGER PRIMARY KEY REFERENCES threads(id),
    question TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS poll_options (
    id INTEGER PRIMARY KEY,
    poll_id INTEGER NOT NULL REFERENCES polls(id),
    name TEXT NOT NULL,
    votes INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_poll_options_poll ON poll_options(poll_id);

CREATE TABLE IF NOT EXISTS poll_voters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    poll_id INTEGER NOT NULL REFERENCES polls(id),
    user_id INTEGER NOT NULL,
    UNIQUE(poll_id, user_id)
);

-- Content-addressed image metadata; md5_hash is null when the download
-- failed but the metadata is still worth keeping
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    filename TEXT,
    md5_hash TEXT,
    size INTEGER
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_images_md5
    ON images(md5_hash) WHERE md5_hash IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_images_url ON images(url);

CREATE TABLE IF NOT EXISTS avatars (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    image_id INTEGER NOT NULL REFERENCES images(id),
    UNIQUE(user_id, image_id)
);

CREATE TABLE IF NOT EXISTS shoutbox_posts (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    date TEXT,
    message TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
