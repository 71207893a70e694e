//! Dual-queue dispatcher
//!
//! Discovered entities flow through two unbounded FIFO channels: registered
//! users on one, everything else on the other. Any number of traversal
//! tasks push concurrently; exactly one [`Consumer`] drains them, users
//! first, so that by the time content lands in the store every registered
//! user it references is already there. Guests are the one permitted
//! exception (resolved synchronously, never queued).

mod consumer;

pub use consumer::{Consumer, ConsumerReport, ConsumerState};

use crate::model::{Content, User};
use tokio::sync::mpsc;

/// A queue message: an entity, or the end-of-stream sentinel.
///
/// The sentinel is explicit (rather than relying on channel closure) because
/// several producer tasks hold clones of the same sender; only the task that
/// owns a scrape target knows when that target is exhausted.
#[derive(Debug, Clone, PartialEq)]
pub enum Queued<T> {
    Item(T),
    Done,
}

pub type UserSender = mpsc::UnboundedSender<Queued<User>>;
pub type UserReceiver = mpsc::UnboundedReceiver<Queued<User>>;
pub type ContentSender = mpsc::UnboundedSender<Queued<Content>>;
pub type ContentReceiver = mpsc::UnboundedReceiver<Queued<Content>>;

/// Creates the user channel
pub fn user_channel() -> (UserSender, UserReceiver) {
    mpsc::unbounded_channel()
}

/// Creates the content channel
pub fn content_channel() -> (ContentSender, ContentReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    #[tokio::test]
    async fn test_channels_preserve_order() {
        let (tx, mut rx) = content_channel();

        for id in 1..=3 {
            tx.send(Queued::Item(Content::Category(Category {
                id,
                name: format!("c{id}"),
            })))
            .unwrap();
        }
        tx.send(Queued::Done).unwrap();

        let mut ids = Vec::new();
        while let Some(queued) = rx.recv().await {
            match queued {
                Queued::Item(Content::Category(c)) => ids.push(c.id),
                Queued::Item(_) => unreachable!(),
                Queued::Done => break,
            }
        }

        assert_eq!(ids, vec![1, 2, 3]);
    }
}
