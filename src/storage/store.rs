//! SQLite-backed forum store
//!
//! One [`ForumStore`] owns the connection for the lifetime of a scrape. The
//! persistence consumer is the only long-lived writer; the traversal side
//! touches the store solely through the guest resolver and avatar linking,
//! serialized behind the same mutex.

use crate::model::{
    Avatar, Board, Category, Content, Image, Moderator, Poll, PollOption, PollVoter, Post,
    ShoutboxPost, Thread, User,
};
use crate::storage::schema::initialize_schema;
use crate::storage::{ArchiveCounts, InsertMode, InsertOutcome, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend for scraped forum entities
pub struct ForumStore {
    conn: Connection,
}

impl ForumStore {
    /// Opens (or creates) the archive database at the given path
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===== Run tracking =====

    /// Records the start of a scrape invocation
    pub fn create_run(&mut self, url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO archive_runs (url, started_at) VALUES (?1, ?2)",
            params![url, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Stamps a run as finished
    pub fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE archive_runs SET finished_at = ?1 WHERE id = ?2",
            params![now, run_id],
        )?;
        Ok(())
    }

    // ===== Users =====

    pub fn upsert_user(&mut self, user: &User, mode: InsertMode) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("users", user.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO users (id, name, username, user_group, date_registered,
                     last_online, age, birthdate, email, gender, location, latest_status,
                     instant_messengers, signature, post_count, website, website_url, url)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18)",
                    params![
                        user.id,
                        user.name,
                        user.username,
                        user.group,
                        user.date_registered,
                        user.last_online,
                        user.age,
                        user.birthdate,
                        user.email,
                        user.gender,
                        user.location,
                        user.latest_status,
                        user.instant_messengers,
                        user.signature,
                        user.post_count,
                        user.website,
                        user.website_url,
                        user.url,
                    ],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE users SET name = ?2, username = ?3, user_group = ?4,
                     date_registered = ?5, last_online = ?6, age = ?7, birthdate = ?8,
                     email = ?9, gender = ?10, location = ?11, latest_status = ?12,
                     instant_messengers = ?13, signature = ?14, post_count = ?15,
                     website = ?16, website_url = ?17, url = ?18
                     WHERE id = ?1",
                    params![
                        user.id,
                        user.name,
                        user.username,
                        user.group,
                        user.date_registered,
                        user.last_online,
                        user.age,
                        user.birthdate,
                        user.email,
                        user.gender,
                        user.location,
                        user.latest_status,
                        user.instant_messengers,
                        user.signature,
                        user.post_count,
                        user.website,
                        user.website_url,
                        user.url,
                    ],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("user", &display_name(user), outcome);
        Ok(outcome)
    }

    /// Resolves a guest display name to its stable negative user id.
    ///
    /// Guests (including deleted users) have no site-assigned id or profile
    /// page, so they are identified by name within the archive. The first
    /// time a name is seen, the next smallest negative id is allocated and a
    /// user row inserted; subsequent calls with the same name return the
    /// same id.
    pub fn resolve_guest(&mut self, name: &str) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE id < 0 AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            tracing::debug!("Guest \"{}\" already known as user {}", name, id);
            return Ok(id);
        }

        let lowest: Option<i64> = self
            .conn
            .query_row("SELECT MIN(id) FROM users WHERE id < 0", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        let new_id = lowest.unwrap_or(0).min(0) - 1;

        self.conn.execute(
            "INSERT INTO users (id, name) VALUES (?1, ?2)",
            params![new_id, name],
        )?;
        tracing::info!("Guest \"{}\" added to database as user {}", name, new_id);

        Ok(new_id)
    }

    /// All guest users (negative ids), most recently allocated first
    pub fn guests(&self) -> StorageResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM users WHERE id < 0 ORDER BY id ASC")?;

        let guests = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    ..User::default()
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(guests)
    }

    pub fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, username, user_group, date_registered, last_online, age,
             birthdate, email, gender, location, latest_status, instant_messengers,
             signature, post_count, website, website_url, url
             FROM users WHERE id = ?1",
        )?;

        let user = stmt
            .query_row(params![id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    username: row.get(2)?,
                    group: row.get(3)?,
                    date_registered: row.get(4)?,
                    last_online: row.get(5)?,
                    age: row.get(6)?,
                    birthdate: row.get(7)?,
                    email: row.get(8)?,
                    gender: row.get(9)?,
                    location: row.get(10)?,
                    latest_status: row.get(11)?,
                    instant_messengers: row.get(12)?,
                    signature: row.get(13)?,
                    post_count: row.get(14)?,
                    website: row.get(15)?,
                    website_url: row.get(16)?,
                    url: row.get(17)?,
                })
            })
            .optional()?;

        Ok(user)
    }

    // ===== Categories =====

    pub fn upsert_category(
        &mut self,
        category: &Category,
        mode: InsertMode,
    ) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("categories", category.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO categories (id, name) VALUES (?1, ?2)",
                    params![category.id, category.name],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE categories SET name = ?2 WHERE id = ?1",
                    params![category.id, category.name],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("category", &category.name, outcome);
        Ok(outcome)
    }

    // ===== Boards =====

    pub fn upsert_board(
        &mut self,
        board: &Board,
        mode: InsertMode,
    ) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("boards", board.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO boards (id, name, description, category_id, parent_id,
                     password_protected, url)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        board.id,
                        board.name,
                        board.description,
                        board.category_id,
                        board.parent_id,
                        board.password_protected,
                        board.url,
                    ],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE boards SET name = ?2, description = ?3, category_id = ?4,
                     parent_id = ?5, password_protected = ?6, url = ?7
                     WHERE id = ?1",
                    params![
                        board.id,
                        board.name,
                        board.description,
                        board.category_id,
                        board.parent_id,
                        board.password_protected,
                        board.url,
                    ],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("board", &board.name, outcome);
        Ok(outcome)
    }

    pub fn get_board(&self, id: i64) -> StorageResult<Option<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, category_id, parent_id, password_protected, url
             FROM boards WHERE id = ?1",
        )?;

        let board = stmt
            .query_row(params![id], |row| {
                Ok(Board {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    category_id: row.get(3)?,
                    parent_id: row.get(4)?,
                    password_protected: row.get(5)?,
                    url: row.get(6)?,
                })
            })
            .optional()?;

        Ok(board)
    }

    /// Moderators of a board, derived from the join table at read time
    pub fn board_moderators(&self, board_id: i64) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM moderators WHERE board_id = ?1 ORDER BY user_id")?;

        let ids = stmt
            .query_map(params![board_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    pub fn upsert_moderator(&mut self, moderator: &Moderator) -> StorageResult<InsertOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO moderators (board_id, user_id) VALUES (?1, ?2)",
            params![moderator.board_id, moderator.user_id],
        )?;

        let outcome = if changed > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Unchanged
        };

        log_outcome(
            "moderator",
            &format!("(user {}, board {})", moderator.user_id, moderator.board_id),
            outcome,
        );
        Ok(outcome)
    }

    // ===== Threads =====

    pub fn upsert_thread(
        &mut self,
        thread: &Thread,
        mode: InsertMode,
    ) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("threads", thread.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO threads (id, title, board_id, user_id, locked, sticky,
                     announcement, views, url)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        thread.id,
                        thread.title,
                        thread.board_id,
                        thread.user_id,
                        thread.locked,
                        thread.sticky,
                        thread.announcement,
                        thread.views,
                        thread.url,
                    ],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE threads SET title = ?2, board_id = ?3, user_id = ?4, locked = ?5,
                     sticky = ?6, announcement = ?7, views = ?8, url = ?9
                     WHERE id = ?1",
                    params![
                        thread.id,
                        thread.title,
                        thread.board_id,
                        thread.user_id,
                        thread.locked,
                        thread.sticky,
                        thread.announcement,
                        thread.views,
                        thread.url,
                    ],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("thread", &thread.title, outcome);
        Ok(outcome)
    }

    pub fn get_thread(&self, id: i64) -> StorageResult<Option<Thread>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, board_id, user_id, locked, sticky, announcement, views, url
             FROM threads WHERE id = ?1",
        )?;

        let thread = stmt
            .query_row(params![id], |row| {
                Ok(Thread {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    board_id: row.get(2)?,
                    user_id: row.get(3)?,
                    locked: row.get(4)?,
                    sticky: row.get(5)?,
                    announcement: row.get(6)?,
                    views: row.get(7)?,
                    url: row.get(8)?,
                })
            })
            .optional()?;

        Ok(thread)
    }

    // ===== Posts =====

    pub fn upsert_post(&mut self, post: &Post, mode: InsertMode) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("posts", post.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO posts (id, thread_id, user_id, date, message, last_edited,
                     edit_user_id, url)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        post.id,
                        post.thread_id,
                        post.user_id,
                        post.date,
                        post.message,
                        post.last_edited,
                        post.edit_user_id,
                        post.url,
                    ],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE posts SET thread_id = ?2, user_id = ?3, date = ?4, message = ?5,
                     last_edited = ?6, edit_user_id = ?7, url = ?8
                     WHERE id = ?1",
                    params![
                        post.id,
                        post.thread_id,
                        post.user_id,
                        post.date,
                        post.message,
                        post.last_edited,
                        post.edit_user_id,
                        post.url,
                    ],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("post", &post.id.to_string(), outcome);
        Ok(outcome)
    }

    pub fn get_post(&self, id: i64) -> StorageResult<Option<Post>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, thread_id, user_id, date, message, last_edited, edit_user_id, url
             FROM posts WHERE id = ?1",
        )?;

        let post = stmt
            .query_row(params![id], |row| {
                Ok(Post {
                    id: row.get(0)?,
                    thread_id: row.get(1)?,
                    user_id: row.get(2)?,
                    date: row.get(3)?,
                    message: row.get(4)?,
                    last_edited: row.get(5)?,
                    edit_user_id: row.get(6)?,
                    url: row.get(7)?,
                })
            })
            .optional()?;

        Ok(post)
    }

    /// Posts of a thread in id order (for verification and export)
    pub fn thread_posts(&self, thread_id: i64) -> StorageResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, thread_id, user_id, date, message, last_edited, edit_user_id, url
             FROM posts WHERE thread_id = ?1 ORDER BY id",
        )?;

        let posts = stmt
            .query_map(params![thread_id], |row| {
                Ok(Post {
                    id: row.get(0)?,
                    thread_id: row.get(1)?,
                    user_id: row.get(2)?,
                    date: row.get(3)?,
                    message: row.get(4)?,
                    last_edited: row.get(5)?,
                    edit_user_id: row.get(6)?,
                    url: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    // ===== Polls =====

    pub fn upsert_poll(&mut self, poll: &Poll, mode: InsertMode) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("polls", poll.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO polls (id, question) VALUES (?1, ?2)",
                    params![poll.id, poll.question],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE polls SET question = ?2 WHERE id = ?1",
                    params![poll.id, poll.question],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("poll", &poll.question, outcome);
        Ok(outcome)
    }

    pub fn upsert_poll_option(
        &mut self,
        option: &PollOption,
        mode: InsertMode,
    ) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("poll_options", option.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO poll_options (id, poll_id, name, votes) VALUES (?1, ?2, ?3, ?4)",
                    params![option.id, option.poll_id, option.name, option.votes],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE poll_options SET poll_id = ?2, name = ?3, votes = ?4 WHERE id = ?1",
                    params![option.id, option.poll_id, option.name, option.votes],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("poll_option", &option.name, outcome);
        Ok(outcome)
    }

    pub fn upsert_poll_voter(&mut self, voter: &PollVoter) -> StorageResult<InsertOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO poll_voters (poll_id, user_id) VALUES (?1, ?2)",
            params![voter.poll_id, voter.user_id],
        )?;

        let outcome = if changed > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Unchanged
        };

        log_outcome(
            "poll_voter",
            &format!("(poll {}, user {})", voter.poll_id, voter.user_id),
            outcome,
        );
        Ok(outcome)
    }

    // ===== Images & avatars =====

    /// Inserts image metadata, deduplicating by MD5 hash when the download
    /// succeeded and by source URL otherwise. Returns the store-assigned
    /// image id alongside the outcome so callers can link avatars.
    pub fn insert_image(
        &mut self,
        image: &Image,
        mode: InsertMode,
    ) -> StorageResult<(InsertOutcome, i64)> {
        let existing: Option<i64> = match &image.md5_hash {
            Some(hash) => self
                .conn
                .query_row(
                    "SELECT id FROM images WHERE md5_hash = ?1",
                    params![hash],
                    |row| row.get(0),
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    "SELECT id FROM images WHERE url = ?1 AND md5_hash IS NULL",
                    params![image.url],
                    |row| row.get(0),
                )
                .optional()?,
        };

        let (outcome, id) = match (existing, mode) {
            (None, _) => {
                self.conn.execute(
                    "INSERT INTO images (url, filename, md5_hash, size) VALUES (?1, ?2, ?3, ?4)",
                    params![image.url, image.filename, image.md5_hash, image.size],
                )?;
                (InsertOutcome::Inserted, self.conn.last_insert_rowid())
            }
            (Some(id), InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE images SET url = ?2, filename = ?3, size = ?4 WHERE id = ?1",
                    params![id, image.url, image.filename, image.size],
                )?;
                (InsertOutcome::Updated, id)
            }
            (Some(id), InsertMode::Skip) => (InsertOutcome::Unchanged, id),
        };

        log_outcome("image", &image.url, outcome);
        Ok((outcome, id))
    }

    pub fn get_image(&self, id: i64) -> StorageResult<Option<Image>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, url, filename, md5_hash, size FROM images WHERE id = ?1")?;

        let image = stmt
            .query_row(params![id], |row| {
                Ok(Image {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    filename: row.get(2)?,
                    md5_hash: row.get(3)?,
                    size: row.get(4)?,
                })
            })
            .optional()?;

        Ok(image)
    }

    pub fn upsert_avatar(&mut self, avatar: &Avatar) -> StorageResult<InsertOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO avatars (user_id, image_id) VALUES (?1, ?2)",
            params![avatar.user_id, avatar.image_id],
        )?;

        let outcome = if changed > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Unchanged
        };

        log_outcome(
            "avatar",
            &format!("(user {}, image {})", avatar.user_id, avatar.image_id),
            outcome,
        );
        Ok(outcome)
    }

    /// A user's avatar image, derived from the join table at read time
    pub fn user_avatar(&self, user_id: i64) -> StorageResult<Option<Image>> {
        let image_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT image_id FROM avatars WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        match image_id {
            Some(id) => self.get_image(id),
            None => Ok(None),
        }
    }

    // ===== Shoutbox =====

    pub fn upsert_shoutbox_post(
        &mut self,
        post: &ShoutboxPost,
        mode: InsertMode,
    ) -> StorageResult<InsertOutcome> {
        let exists = self.id_exists("shoutbox_posts", post.id)?;

        let outcome = match (exists, mode) {
            (false, _) => {
                self.conn.execute(
                    "INSERT INTO shoutbox_posts (id, user_id, date, message)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![post.id, post.user_id, post.date, post.message],
                )?;
                InsertOutcome::Inserted
            }
            (true, InsertMode::Update) => {
                self.conn.execute(
                    "UPDATE shoutbox_posts SET user_id = ?2, date = ?3, message = ?4
                     WHERE id = ?1",
                    params![post.id, post.user_id, post.date, post.message],
                )?;
                InsertOutcome::Updated
            }
            (true, InsertMode::Skip) => InsertOutcome::Unchanged,
        };

        log_outcome("shoutbox_post", &post.id.to_string(), outcome);
        Ok(outcome)
    }

    // ===== Dispatch =====

    /// Applies a content-queue item to the matching upsert
    pub fn apply_content(
        &mut self,
        content: &Content,
        mode: InsertMode,
    ) -> StorageResult<InsertOutcome> {
        match content {
            Content::Category(c) => self.upsert_category(c, mode),
            Content::Board(b) => self.upsert_board(b, mode),
            Content::Moderator(m) => self.upsert_moderator(m),
            Content::Thread(t) => self.upsert_thread(t, mode),
            Content::Post(p) => self.upsert_post(p, mode),
            Content::Poll(p) => self.upsert_poll(p, mode),
            Content::PollOption(o) => self.upsert_poll_option(o, mode),
            Content::PollVoter(v) => self.upsert_poll_voter(v),
            Content::Image(i) => self.insert_image(i, mode).map(|(outcome, _)| outcome),
            Content::ShoutboxPost(s) => self.upsert_shoutbox_post(s, mode),
        }
    }

    // ===== Statistics =====

    /// Row counts for every entity table
    pub fn counts(&self) -> StorageResult<ArchiveCounts> {
        Ok(ArchiveCounts {
            users: self.count_table("users")?,
            categories: self.count_table("categories")?,
            boards: self.count_table("boards")?,
            moderators: self.count_table("moderators")?,
            threads: self.count_table("threads")?,
            posts: self.count_table("posts")?,
            polls: self.count_table("polls")?,
            poll_options: self.count_table("poll_options")?,
            poll_voters: self.count_table("poll_voters")?,
            images: self.count_table("images")?,
            avatars: self.count_table("avatars")?,
            shoutbox_posts: self.count_table("shoutbox_posts")?,
        })
    }

    fn count_table(&self, table: &str) -> StorageResult<u64> {
        // Table names come from the fixed list in counts(); never user input.
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    fn id_exists(&self, table: &str, id: i64) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE id = ?1"),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn display_name(user: &User) -> String {
    user.name
        .clone()
        .unwrap_or_else(|| format!("user {}", user.id))
}

fn log_outcome(kind: &str, desc: &str, outcome: InsertOutcome) {
    match outcome {
        InsertOutcome::Inserted => tracing::info!("{} {} added to database", kind, desc),
        InsertOutcome::Updated => tracing::info!("{} {} updated in database", kind, desc),
        InsertOutcome::Unchanged => {
            tracing::debug!("{} {} already exists in database; skipping", kind, desc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ForumStore {
        ForumStore::open_in_memory().unwrap()
    }

    fn test_user(id: i64, name: &str) -> User {
        User {
            id,
            name: Some(name.to_string()),
            username: Some(name.to_lowercase()),
            post_count: Some(10),
            ..User::default()
        }
    }

    fn test_board(id: i64) -> Board {
        Board {
            id,
            name: format!("Board {id}"),
            description: Some("A board".to_string()),
            ..Board::default()
        }
    }

    #[test]
    fn test_run_tracking() {
        let mut store = store();

        let run_id = store.create_run("https://example.proboards.com").unwrap();
        assert!(run_id > 0);

        store.complete_run(run_id).unwrap();

        let finished: Option<String> = store
            .conn
            .query_row(
                "SELECT finished_at FROM archive_runs WHERE id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .unwrap();
        assert!(finished.is_some());
    }

    #[test]
    fn test_upsert_user_insert_then_skip() {
        let mut store = store();
        let user = test_user(1, "Alice");

        assert_eq!(
            store.upsert_user(&user, InsertMode::Skip).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_user(&user, InsertMode::Skip).unwrap(),
            InsertOutcome::Unchanged
        );

        let stored = store.get_user(1).unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_upsert_user_update_mode_overwrites() {
        let mut store = store();
        store
            .upsert_user(&test_user(1, "Alice"), InsertMode::Skip)
            .unwrap();

        let mut changed = test_user(1, "Alice");
        changed.post_count = Some(42);
        assert_eq!(
            store.upsert_user(&changed, InsertMode::Update).unwrap(),
            InsertOutcome::Updated
        );

        let stored = store.get_user(1).unwrap().unwrap();
        assert_eq!(stored.post_count, Some(42));
    }

    #[test]
    fn test_resolve_guest_allocates_descending_ids() {
        let mut store = store();

        assert_eq!(store.resolve_guest("Anon").unwrap(), -1);
        assert_eq!(store.resolve_guest("Ghost").unwrap(), -2);
    }

    #[test]
    fn test_resolve_guest_is_stable() {
        let mut store = store();

        let first = store.resolve_guest("Anon").unwrap();
        let second = store.resolve_guest("Anon").unwrap();

        assert_eq!(first, second);
        assert_eq!(store.guests().unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_guest_ignores_registered_users() {
        let mut store = store();
        store
            .upsert_user(&test_user(7, "Anon"), InsertMode::Skip)
            .unwrap();

        // Same display name as a registered user still gets a guest row.
        assert_eq!(store.resolve_guest("Anon").unwrap(), -1);
    }

    #[test]
    fn test_upsert_moderator_unique_pair() {
        let mut store = store();
        store
            .upsert_board(&test_board(3), InsertMode::Skip)
            .unwrap();

        let moderator = Moderator {
            board_id: 3,
            user_id: 5,
        };
        assert_eq!(
            store.upsert_moderator(&moderator).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_moderator(&moderator).unwrap(),
            InsertOutcome::Unchanged
        );
        assert_eq!(store.board_moderators(3).unwrap(), vec![5]);
    }

    #[test]
    fn test_moderator_may_reference_unknown_user() {
        let mut store = store();
        store
            .upsert_board(&test_board(3), InsertMode::Skip)
            .unwrap();

        // No user 99 in the store; the link must still be recordable.
        let result = store.upsert_moderator(&Moderator {
            board_id: 3,
            user_id: 99,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_board_tree() {
        let mut store = store();

        let parent = test_board(1);
        let mut child = test_board(2);
        child.parent_id = Some(1);

        store.upsert_board(&parent, InsertMode::Skip).unwrap();
        store.upsert_board(&child, InsertMode::Skip).unwrap();

        let stored = store.get_board(2).unwrap().unwrap();
        assert_eq!(stored.parent_id, Some(1));
    }

    #[test]
    fn test_image_dedup_by_md5() {
        let mut store = store();

        let image = Image {
            id: None,
            url: "https://a.example/pic.png".to_string(),
            filename: Some("abc.png".to_string()),
            md5_hash: Some("abc".to_string()),
            size: Some(100),
        };

        let (outcome, id1) = store.insert_image(&image, InsertMode::Skip).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);

        // Same hash from a different URL resolves to the same row.
        let mut mirror = image.clone();
        mirror.url = "https://b.example/same-pic.png".to_string();
        let (outcome, id2) = store.insert_image(&mirror, InsertMode::Skip).unwrap();
        assert_eq!(outcome, InsertOutcome::Unchanged);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_image_failed_download_dedup_by_url() {
        let mut store = store();

        let failed = Image {
            id: None,
            url: "https://dead.example/gone.png".to_string(),
            filename: None,
            md5_hash: None,
            size: None,
        };

        let (_, id1) = store.insert_image(&failed, InsertMode::Skip).unwrap();
        let (outcome, id2) = store.insert_image(&failed, InsertMode::Skip).unwrap();

        assert_eq!(outcome, InsertOutcome::Unchanged);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_avatar_links_user_to_image() {
        let mut store = store();
        store
            .upsert_user(&test_user(1, "Alice"), InsertMode::Skip)
            .unwrap();

        let image = Image {
            id: None,
            url: "https://a.example/avatar.png".to_string(),
            filename: Some("fff.png".to_string()),
            md5_hash: Some("fff".to_string()),
            size: Some(5),
        };
        let (_, image_id) = store.insert_image(&image, InsertMode::Skip).unwrap();

        store
            .upsert_avatar(&Avatar {
                user_id: 1,
                image_id,
            })
            .unwrap();

        let avatar = store.user_avatar(1).unwrap().unwrap();
        assert_eq!(avatar.md5_hash.as_deref(), Some("fff"));
    }

    #[test]
    fn test_poll_hierarchy() {
        let mut store = store();
        store
            .upsert_board(&test_board(1), InsertMode::Skip)
            .unwrap();
        store
            .upsert_thread(
                &Thread {
                    id: 10,
                    title: "Poll thread".to_string(),
                    board_id: 1,
                    user_id: 1,
                    ..Thread::default()
                },
                InsertMode::Skip,
            )
            .unwrap();

        store
            .upsert_poll(
                &Poll {
                    id: 10,
                    question: "Favorite color?".to_string(),
                },
                InsertMode::Skip,
            )
            .unwrap();
        store
            .upsert_poll_option(
                &PollOption {
                    id: 100,
                    poll_id: 10,
                    name: "Red".to_string(),
                    votes: 3,
                },
                InsertMode::Skip,
            )
            .unwrap();

        let voter = PollVoter {
            poll_id: 10,
            user_id: 1,
        };
        assert_eq!(
            store.upsert_poll_voter(&voter).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_poll_voter(&voter).unwrap(),
            InsertOutcome::Unchanged
        );
    }

    #[test]
    fn test_counts() {
        let mut store = store();
        store
            .upsert_user(&test_user(1, "Alice"), InsertMode::Skip)
            .unwrap();
        store
            .upsert_board(&test_board(1), InsertMode::Skip)
            .unwrap();

        let counts = store.counts().unwrap();
        assert_eq!(counts.users, 1);
        assert_eq!(counts.boards, 1);
        assert_eq!(counts.posts, 0);
    }

    #[test]
    fn test_apply_content_dispatches() {
        let mut store = store();

        let outcome = store
            .apply_content(
                &Content::Category(Category {
                    id: 2,
                    name: "General".to_string(),
                }),
                InsertMode::Skip,
            )
            .unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(store.counts().unwrap().categories, 1);
    }
}
