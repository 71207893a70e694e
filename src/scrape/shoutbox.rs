//! Shoutbox scraping
//!
//! Shoutbox messages appear on the homepage itself, so no extra fetch is
//! needed; rows are extracted from the already-fetched homepage markup.
//! Messages are flat (no parent entity) and may be authored by guests,
//! which are resolved synchronously like any other guest authorship.

use crate::model::{Content, ShoutboxPost};
use crate::scrape::{extract, ScrapeSession};
use crate::Result;

/// Emits every shoutbox message found in the homepage markup
pub fn scrape_shoutbox(session: &ScrapeSession, homepage_html: &str) -> Result<()> {
    let rows = extract::shoutbox_rows(homepage_html)?;

    if rows.is_empty() {
        tracing::debug!("No shoutbox messages on homepage");
        return Ok(());
    }

    tracing::info!("Found {} shoutbox messages", rows.len());

    for row in rows {
        let user_id = match session.resolve_author(&row.author) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Abandoning shoutbox post {}: {}", row.id, e);
                continue;
            }
        };

        session.put_content(Content::ShoutboxPost(ShoutboxPost {
            id: row.id,
            user_id,
            date: row.date,
            message: row.message,
        }))?;
    }

    Ok(())
}
