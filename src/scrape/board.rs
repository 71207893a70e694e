//! Board subtree traversal
//!
//! Emission order per subtree is what keeps insertion valid downstream: the
//! board record first, then its moderator links, then sub-boards (each
//! recursively before its own children), then every thread across the
//! paginated thread listing. Password-protected boards expose only their
//! name; they are recorded as such and never descended into.

use crate::model::{Board, Content, Moderator};
use crate::scrape::{extract, thread::scrape_thread, ScrapeSession};
use crate::urls;
use crate::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Scrapes a board and everything beneath it.
///
/// `category_id`/`parent_id` carry the linkage discovered on the parent
/// page (both `None` when the board URL was the scrape target itself);
/// `moderator_ids` is the moderator list shown next to the board's link on
/// its parent page.
///
/// Boxed because sub-board recursion makes this future self-referential.
pub fn scrape_board<'a>(
    session: &'a Arc<ScrapeSession>,
    url: &'a str,
    category_id: Option<i64>,
    parent_id: Option<i64>,
    moderator_ids: Vec<i64>,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let board_id = urls::id_from_url(url)?;
        let html = session.fetch(url).await?;
        let page = extract::board_page(&html)?;

        session.put_content(Content::Board(Board {
            id: board_id,
            name: page.name.clone(),
            description: page.description.clone(),
            category_id,
            parent_id,
            password_protected: page.password_protected,
            url: Some(url.to_string()),
        }))?;

        for user_id in moderator_ids {
            session.put_content(Content::Moderator(Moderator { board_id, user_id }))?;
        }

        if page.password_protected {
            tracing::info!(
                "Board \"{}\" is password protected; not descending",
                page.name
            );
            return Ok(());
        }

        for sub in page.sub_boards {
            let sub_url = urls::join_href(session.base_url(), &sub.href);

            if let Err(e) = scrape_board(
                session,
                &sub_url,
                category_id,
                Some(board_id),
                sub.moderator_ids,
            )
            .await
            {
                tracing::warn!("Abandoning sub-board {}: {}", sub_url, e);
            }
        }

        // Walk the thread listing page by page; each thread's subtree is
        // abandoned individually on failure.
        let mut threads = page.threads;
        let mut next_href = page.next_href;

        loop {
            for listing in threads {
                let thread_url = urls::join_href(session.base_url(), &listing.href);

                if let Err(e) = scrape_thread(
                    session,
                    &thread_url,
                    Some(board_id),
                    Some(listing.author),
                    listing.locked,
                    listing.sticky,
                    listing.announcement,
                    listing.views,
                )
                .await
                {
                    tracing::warn!("Abandoning thread {}: {}", thread_url, e);
                }
            }

            let Some(href) = next_href else {
                break;
            };
            let next_url = urls::join_href(session.base_url(), &href);
            tracing::info!("Getting source for {}", next_url);

            let html = match session.fetch(&next_url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Abandoning thread listing at {}: {}", next_url, e);
                    break;
                }
            };

            match extract::board_thread_page(&html) {
                Ok((page_threads, page_next)) => {
                    threads = page_threads;
                    next_href = page_next;
                }
                Err(e) => {
                    tracing::warn!("Abandoning thread listing at {}: {}", next_url, e);
                    break;
                }
            }
        }

        Ok(())
    })
}
