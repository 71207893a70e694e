//! Full-forum traversal entry point
//!
//! The homepage lists every category with its top-level boards (and their
//! moderator ids). Each category is emitted before its boards; each board
//! subtree is walked to completion before the next begins. The homepage also
//! hosts the shoutbox, which is scraped from the same fetch.

use crate::model::Content;
use crate::scrape::{extract, scrape_board, scrape_shoutbox, ScrapeSession};
use crate::urls;
use crate::Result;
use std::sync::Arc;

/// Scrapes all categories, boards, threads and posts from the homepage down
pub async fn scrape_forum(session: &Arc<ScrapeSession>, base_url: &str) -> Result<()> {
    let html = session.fetch(base_url).await?;
    let blocks = extract::homepage_categories(&html)?;

    tracing::info!("Found {} categories on homepage", blocks.len());

    for block in blocks {
        let category_id = block.category.id;
        session.put_content(Content::Category(block.category))?;

        for listing in block.boards {
            let board_url = urls::join_href(session.base_url(), &listing.href);

            if let Err(e) = scrape_board(
                session,
                &board_url,
                Some(category_id),
                None,
                listing.moderator_ids,
            )
            .await
            {
                tracing::warn!("Abandoning board {}: {}", board_url, e);
            }
        }
    }

    if let Err(e) = scrape_shoutbox(session, &html) {
        tracing::warn!("Abandoning shoutbox: {}", e);
    }

    Ok(())
}
