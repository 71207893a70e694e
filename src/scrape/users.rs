//! Users collection traversal
//!
//! The member list is paginated; every page contributes profile hrefs and a
//! "next" control. Once the full URL list is known, one fetch-and-extract
//! task per profile runs concurrently, each emitting exactly one User record
//! onto the user queue. The caller owns the end-of-users sentinel.

use crate::scrape::{extract, ScrapeSession};
use crate::urls;
use crate::Result;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Scrapes every user reachable from the paginated members listing
pub async fn scrape_users(session: &Arc<ScrapeSession>, url: &str) -> Result<()> {
    tracing::info!("Getting user profile URLs from {}", url);

    let mut profile_hrefs = Vec::new();
    let mut page_url = url.to_string();
    let mut first_page = true;

    loop {
        // The first listing page failing is fatal (nothing to scrape);
        // later pages failing abandon the remainder of the listing only.
        let html = match session.fetch(&page_url).await {
            Ok(html) => html,
            Err(e) if first_page => return Err(e),
            Err(e) => {
                tracing::warn!("Abandoning member listing at {}: {}", page_url, e);
                break;
            }
        };

        let listing = match extract::member_listing(&html) {
            Ok(listing) => listing,
            Err(e) if first_page => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Abandoning member listing at {}: {}", page_url, e);
                break;
            }
        };

        first_page = false;
        profile_hrefs.extend(listing.profile_hrefs);

        match listing.next_href {
            Some(next) => page_url = urls::join_href(session.base_url(), &next),
            None => break,
        }
    }

    tracing::info!("Found {} user profile URLs", profile_hrefs.len());

    let mut tasks = JoinSet::new();

    for href in profile_hrefs {
        let profile_url = urls::join_href(session.base_url(), &href);
        let session = Arc::clone(session);

        tasks.spawn(async move {
            if let Err(e) = scrape_profile(&session, &profile_url).await {
                tracing::warn!("Abandoning user profile {}: {}", profile_url, e);
            }
        });
    }

    while tasks.join_next().await.is_some() {}

    Ok(())
}

/// Scrapes a single user profile (the `/user/{id}` entry point)
pub async fn scrape_user(session: &Arc<ScrapeSession>, url: &str) -> Result<()> {
    scrape_profile(session, url).await
}

async fn scrape_profile(session: &ScrapeSession, url: &str) -> Result<()> {
    let id = urls::id_from_url(url)?;
    let html = session.fetch(url).await?;
    let profile = extract::user_profile(&html, url, id)?;

    // The avatar link needs the store-assigned image id, so it is resolved
    // inline rather than queued; failure costs the avatar, not the user.
    if let Some(avatar_url) = &profile.avatar_url {
        if let Err(e) = session.record_avatar(id, avatar_url).await {
            tracing::warn!("Failed to record avatar for user {}: {}", id, e);
        }
    }

    session.put_user(profile.user)?;
    tracing::debug!("Got user profile info for user {}", id);
    Ok(())
}
