//! Traversal engine
//!
//! This module walks the forum's hierarchical structure and emits every
//! discovered entity into the dispatcher queues exactly once:
//!
//! - [`users::scrape_users`] paginates the member list and fans out one
//!   task per profile
//! - [`forum::scrape_forum`] walks homepage categories into boards
//! - [`board::scrape_board`] emits a board, its moderators, sub-boards and
//!   threads
//! - [`thread::scrape_thread`] emits a thread, its poll, and its posts
//!
//! [`run_archive`] wires the producers to the persistence consumer and runs
//! everything to completion. Parse failures abandon the affected subtree
//! and are logged; they never unwind the whole traversal.

mod board;
mod extract;
mod forum;
mod shoutbox;
mod thread;
mod users;

pub use board::scrape_board;
pub use extract::{AuthorRef, ExtractError};
pub use forum::scrape_forum;
pub use shoutbox::scrape_shoutbox;
pub use thread::scrape_thread;
pub use users::{scrape_user, scrape_users};

use crate::auth;
use crate::config::Config;
use crate::dispatch::{
    content_channel, user_channel, Consumer, ConsumerReport, ContentSender, Queued, UserSender,
};
use crate::http::{build_http_client, Fetcher, RateLimiter};
use crate::model::{Avatar, Content, User};
use crate::render::PageRenderer;
use crate::storage::{ArchiveCounts, ForumStore, InsertMode};
use crate::urls::{classify_url, split_url, ScrapeTarget};
use crate::{ArchiveError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Shared context handed to every traversal function
///
/// The store handle is shared with the persistence consumer; producers only
/// touch it for the two synchronous exceptions (guest resolution and avatar
/// linking), serialized behind the same mutex as the consumer's writes.
pub struct ScrapeSession {
    fetcher: Fetcher,
    renderer: PageRenderer,
    store: Arc<Mutex<ForumStore>>,
    user_tx: UserSender,
    content_tx: ContentSender,
    image_dir: PathBuf,
    base_url: String,
    mode: InsertMode,
}

impl ScrapeSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Fetcher,
        renderer: PageRenderer,
        store: Arc<Mutex<ForumStore>>,
        user_tx: UserSender,
        content_tx: ContentSender,
        image_dir: PathBuf,
        base_url: String,
        mode: InsertMode,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            store,
            user_tx,
            content_tx,
            image_dir,
            base_url,
            mode,
        }
    }

    /// Site base URL that relative hrefs are joined against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn renderer(&self) -> &PageRenderer {
        &self.renderer
    }

    /// Fetches a forum page through the rate limiter
    pub async fn fetch(&self, url: &str) -> Result<String> {
        self.fetcher.get_page(url).await
    }

    /// Emits a user record onto the user queue
    pub fn put_user(&self, user: User) -> Result<()> {
        self.user_tx
            .send(Queued::Item(user))
            .map_err(|_| ArchiveError::QueueClosed("user"))
    }

    /// Emits a content record onto the content queue
    pub fn put_content(&self, content: Content) -> Result<()> {
        self.content_tx
            .send(Queued::Item(content))
            .map_err(|_| ArchiveError::QueueClosed("content"))
    }

    /// Pushes the end-of-users sentinel
    pub fn end_users(&self) -> Result<()> {
        self.user_tx
            .send(Queued::Done)
            .map_err(|_| ArchiveError::QueueClosed("user"))
    }

    /// Pushes the end-of-content sentinel
    pub fn end_content(&self) -> Result<()> {
        self.content_tx
            .send(Queued::Done)
            .map_err(|_| ArchiveError::QueueClosed("content"))
    }

    /// Resolves an author reference to a user id usable as a foreign key.
    ///
    /// Guests are resolved synchronously against the store (never queued) so
    /// the id can be referenced by the in-flight thread or post immediately.
    pub fn resolve_author(&self, author: &AuthorRef) -> Result<i64> {
        match author {
            AuthorRef::Registered(id) => Ok(*id),
            AuthorRef::Guest(name) => {
                let mut store = lock_store(&self.store);
                Ok(store.resolve_guest(name)?)
            }
        }
    }

    /// Downloads a user's avatar and links it in the store.
    ///
    /// This bypasses the content queue: the avatar link needs the
    /// store-assigned image id, which only exists once the image row does.
    /// Download failure still records the image metadata (null hash) so the
    /// link stays valid.
    pub async fn record_avatar(&self, user_id: i64, avatar_url: &str) -> Result<()> {
        let download = self
            .fetcher
            .download_image(avatar_url, &self.image_dir)
            .await;

        let mut store = lock_store(&self.store);
        let (_, image_id) = store.insert_image(&download.image, self.mode)?;
        store.upsert_avatar(&Avatar { user_id, image_id })?;
        Ok(())
    }
}

fn lock_store(store: &Arc<Mutex<ForumStore>>) -> std::sync::MutexGuard<'_, ForumStore> {
    match store.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Which queue(s) a producer task owns the sentinel for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SentinelFor {
    Users,
    Content,
    Both,
}

/// Runs a producer and pushes the sentinel(s) it owns when it finishes,
/// whether it succeeded or not; the consumer must always terminate.
async fn with_sentinel<F>(task: F, sentinel: SentinelFor, session: &ScrapeSession) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let result = task.await;

    if matches!(sentinel, SentinelFor::Users | SentinelFor::Both) {
        session.end_users()?;
    }
    if matches!(sentinel, SentinelFor::Content | SentinelFor::Both) {
        session.end_content()?;
    }

    result
}

/// Runtime options not covered by the config file
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub username: Option<String>,
    pub password: Option<String>,
    pub cookies_file: Option<PathBuf>,
    pub skip_users: bool,
    pub mode: InsertMode,
}

/// Summary of a completed archive run
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub report: ConsumerReport,
    pub counts: ArchiveCounts,
    pub requests: u64,
}

/// Scrapes the target URL into `<out-dir>/forum.db` and `<out-dir>/images/`.
///
/// The URL's path shape picks the scrape: homepage (whole site), `/members`
/// (users only), `/user/{id}`, `/board/{id}/...`, `/thread/{id}/...`.
pub async fn run_archive(
    config: Config,
    url: &str,
    options: ArchiveOptions,
) -> Result<ArchiveSummary> {
    let (base_url, _) = split_url(url)?;
    let target = classify_url(url)?;

    let out_dir = Path::new(&config.output.out_dir);
    let image_dir = out_dir.join("images");
    std::fs::create_dir_all(&image_dir)?;

    let store = Arc::new(Mutex::new(ForumStore::open(&out_dir.join("forum.db"))?));
    let run_id = lock_store(&store).create_run(url)?;

    // Login happens before any traversal; a failed login is fatal since an
    // unauthenticated walk would silently miss members-only content.
    let jar = match (&options.cookies_file, &options.username, &options.password) {
        (Some(path), _, _) => {
            let cookies = auth::load_cookie_file(path)?;
            Some(auth::build_cookie_jar(&cookies, &base_url)?)
        }
        (None, Some(username), Some(password)) => {
            let helper = config.auth.helper_command.as_deref().ok_or_else(|| {
                ArchiveError::Auth(
                    "credentials given but no auth.helper-command configured".to_string(),
                )
            })?;
            let cookies = auth::login_with_helper(helper, &base_url, username, password).await?;
            Some(auth::build_cookie_jar(&cookies, &base_url)?)
        }
        _ => {
            tracing::info!("Username and/or password not provided; proceeding without login");
            None
        }
    };

    let client = build_http_client(&config.http, jar)?;
    let limiter = RateLimiter::new(&config.rate_limit);
    let fetcher = Fetcher::new(client, limiter, &base_url, &config.http);
    let renderer = PageRenderer::from_config(&config.render);

    let (user_tx, user_rx) = user_channel();
    let (content_tx, content_rx) = content_channel();

    let scrape_users_requested = match target {
        ScrapeTarget::Forum => !options.skip_users,
        ScrapeTarget::Members | ScrapeTarget::User(_) => true,
        ScrapeTarget::Board(_) | ScrapeTarget::Thread(_) => false,
    };

    let session = Arc::new(ScrapeSession::new(
        fetcher,
        renderer,
        store.clone(),
        user_tx,
        content_tx,
        image_dir,
        base_url.clone(),
        options.mode,
    ));

    let consumer = Consumer::new(
        store.clone(),
        scrape_users_requested.then_some(user_rx),
        content_rx,
        options.mode,
    );
    let consumer_task = tokio::spawn(consumer.run());

    let producer_result = match target {
        ScrapeTarget::Forum => {
            tracing::info!("Scraping entire forum at {}", base_url);

            let content = with_sentinel(
                scrape_forum(&session, &base_url),
                SentinelFor::Content,
                &session,
            );

            if scrape_users_requested {
                let members_url = format!("{base_url}/members");
                let users = with_sentinel(
                    scrape_users(&session, &members_url),
                    SentinelFor::Users,
                    &session,
                );
                let (users_result, content_result) = tokio::join!(users, content);
                users_result.and(content_result)
            } else {
                tracing::info!("Skipping user profiles");
                content.await
            }
        }
        ScrapeTarget::Members => {
            tracing::info!("Scraping all users from {}", url);
            with_sentinel(
                scrape_users(&session, url),
                SentinelFor::Both,
                &session,
            )
            .await
        }
        ScrapeTarget::User(id) => {
            tracing::info!("Scraping single user {}", id);
            with_sentinel(scrape_user(&session, url), SentinelFor::Both, &session).await
        }
        ScrapeTarget::Board(_) => {
            tracing::info!("Scraping board subtree at {}", url);
            with_sentinel(
                scrape_board(&session, url, None, None, Vec::new()),
                SentinelFor::Content,
                &session,
            )
            .await
        }
        ScrapeTarget::Thread(_) => {
            tracing::info!("Scraping single thread at {}", url);
            with_sentinel(
                scrape_thread(&session, url, None, None, false, false, false, None),
                SentinelFor::Content,
                &session,
            )
            .await
        }
    };

    let report = match consumer_task.await {
        Ok(report) => report?,
        Err(e) if e.is_panic() => return Err(ArchiveError::QueueClosed("consumer panicked")),
        Err(_) => return Err(ArchiveError::QueueClosed("consumer cancelled")),
    };

    // Producer failures surface after the consumer has drained what was
    // emitted; partial data is still valid data.
    producer_result?;

    let (counts, requests) = {
        let mut store = lock_store(&store);
        store.complete_run(run_id)?;
        (store.counts()?, session.fetcher.request_count())
    };

    tracing::info!(
        "Archive complete: {} rows total after {} requests",
        counts.total(),
        requests
    );

    Ok(ArchiveSummary {
        report,
        counts,
        requests,
    })
}
