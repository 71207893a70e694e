//! Single-writer persistence consumer
//!
//! The consumer is the only long-lived writer to the store. It runs a small
//! state machine: drain the user queue to its sentinel (skipped when no
//! users scrape was requested), then drain the content queue to its
//! sentinel, then shut down. Per-item storage failures are logged and
//! counted, never propagated; a half-scraped archive is still a valid
//! archive.

use crate::dispatch::{ContentReceiver, Queued, UserReceiver};
use crate::storage::{ForumStore, InsertMode, InsertOutcome};
use crate::Result;
use std::sync::{Arc, Mutex};

/// Consumer state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    DrainUsers,
    DrainContent,
    Shutdown,
}

/// Tallies from a completed consumer run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub users_inserted: u64,
    pub users_unchanged: u64,
    pub content_inserted: u64,
    pub content_unchanged: u64,
    pub failed: u64,
}

impl ConsumerReport {
    fn record(&mut self, outcome: InsertOutcome, is_user: bool) {
        match (outcome, is_user) {
            (InsertOutcome::Inserted | InsertOutcome::Updated, true) => self.users_inserted += 1,
            (InsertOutcome::Unchanged, true) => self.users_unchanged += 1,
            (InsertOutcome::Inserted | InsertOutcome::Updated, false) => {
                self.content_inserted += 1
            }
            (InsertOutcome::Unchanged, false) => self.content_unchanged += 1,
        }
    }
}

/// Drains the user and content queues into the store, in that order
pub struct Consumer {
    store: Arc<Mutex<ForumStore>>,
    user_rx: Option<UserReceiver>,
    content_rx: ContentReceiver,
    mode: InsertMode,
}

impl Consumer {
    /// Creates a consumer.
    ///
    /// `user_rx` is `None` when the scrape target has no users collection
    /// (board or thread URLs); the state machine then starts directly in
    /// [`ConsumerState::DrainContent`].
    pub fn new(
        store: Arc<Mutex<ForumStore>>,
        user_rx: Option<UserReceiver>,
        content_rx: ContentReceiver,
        mode: InsertMode,
    ) -> Self {
        Self {
            store,
            user_rx,
            content_rx,
            mode,
        }
    }

    /// Runs the state machine to completion
    pub async fn run(mut self) -> Result<ConsumerReport> {
        let mut report = ConsumerReport::default();
        let mut state = if self.user_rx.is_some() {
            ConsumerState::DrainUsers
        } else {
            ConsumerState::DrainContent
        };

        loop {
            match state {
                ConsumerState::DrainUsers => {
                    self.drain_users(&mut report).await;
                    state = ConsumerState::DrainContent;
                }
                ConsumerState::DrainContent => {
                    self.drain_content(&mut report).await;
                    state = ConsumerState::Shutdown;
                }
                ConsumerState::Shutdown => {
                    tracing::info!(
                        "Consumer finished: {} users, {} content items stored \
                         ({} unchanged, {} failed)",
                        report.users_inserted,
                        report.content_inserted,
                        report.users_unchanged + report.content_unchanged,
                        report.failed
                    );
                    return Ok(report);
                }
            }
        }
    }

    async fn drain_users(&mut self, report: &mut ConsumerReport) {
        let Some(user_rx) = self.user_rx.as_mut() else {
            return;
        };

        tracing::debug!("Consumer draining user queue");

        loop {
            match user_rx.recv().await {
                Some(Queued::Item(user)) => {
                    let result = {
                        let mut store = lock_store(&self.store);
                        store.upsert_user(&user, self.mode)
                    };
                    match result {
                        Ok(outcome) => report.record(outcome, true),
                        Err(e) => {
                            report.failed += 1;
                            tracing::error!("Failed to store user {}: {}", user.id, e);
                        }
                    }
                }
                Some(Queued::Done) => return,
                None => {
                    tracing::warn!("User queue closed before its sentinel arrived");
                    return;
                }
            }
        }
    }

    async fn drain_content(&mut self, report: &mut ConsumerReport) {
        tracing::debug!("Consumer draining content queue");

        loop {
            match self.content_rx.recv().await {
                Some(Queued::Item(content)) => {
                    let result = {
                        let mut store = lock_store(&self.store);
                        store.apply_content(&content, self.mode)
                    };
                    match result {
                        Ok(outcome) => report.record(outcome, false),
                        Err(e) => {
                            report.failed += 1;
                            tracing::error!("Failed to store {}: {}", content.kind(), e);
                        }
                    }
                }
                Some(Queued::Done) => return,
                None => {
                    tracing::warn!("Content queue closed before its sentinel arrived");
                    return;
                }
            }
        }
    }
}

pub(crate) fn lock_store(store: &Arc<Mutex<ForumStore>>) -> std::sync::MutexGuard<'_, ForumStore> {
    // A poisoned mutex means another store user panicked; the data itself
    // is still consistent (SQLite transactions), so keep going.
    match store.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
