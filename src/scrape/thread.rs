//! Thread traversal
//!
//! A thread's record is emitted before anything it owns: poll data first
//! (poll, then options, then voters), then every post across the paginated
//! post listing. Poll voter lists are client-rendered, so the poll fetch
//! goes through the JS renderer collaborator; without one, polls are
//! skipped and the posts still archived.

use crate::model::{Content, Poll, PollVoter, Post, Thread};
use crate::scrape::extract::{self, AuthorRef, PostRow};
use crate::scrape::ScrapeSession;
use crate::urls;
use crate::Result;
use std::sync::Arc;

/// Scrapes a thread and its posts (and poll, if any).
///
/// `author` is the creator as shown in the board's thread listing; when the
/// thread URL was the scrape target itself it is `None` and the first
/// post's author is used instead. Likewise `board_id` falls back to the
/// board breadcrumb on the thread page.
#[allow(clippy::too_many_arguments)]
pub async fn scrape_thread(
    session: &Arc<ScrapeSession>,
    url: &str,
    board_id: Option<i64>,
    author: Option<AuthorRef>,
    locked: bool,
    sticky: bool,
    announcement: bool,
    views: Option<i64>,
) -> Result<()> {
    let thread_id = urls::id_from_url(url)?;
    let html = session.fetch(url).await?;
    let page = extract::thread_page(&html)?;

    let board_id = match board_id {
        Some(id) => id,
        None => {
            let href = page
                .board_href
                .as_deref()
                .ok_or(extract::ExtractError::Missing("thread board breadcrumb"))?;
            urls::id_from_url(&urls::join_href(session.base_url(), href))?
        }
    };

    let author = match author {
        Some(author) => author,
        None => page
            .posts
            .first()
            .map(|post| post.author.clone())
            .ok_or(extract::ExtractError::Missing("thread first post"))?,
    };
    let user_id = session.resolve_author(&author)?;

    session.put_content(Content::Thread(Thread {
        id: thread_id,
        title: page.title.clone(),
        board_id,
        user_id,
        locked,
        sticky,
        announcement,
        views,
        url: Some(url.to_string()),
    }))?;

    if page.has_poll {
        if session.renderer().is_enabled() {
            if let Err(e) = scrape_poll(session, url, thread_id).await {
                tracing::warn!("Abandoning poll for thread {}: {}", thread_id, e);
            }
        } else {
            tracing::warn!(
                "Thread {} has a poll but no renderer is configured; skipping it",
                thread_id
            );
        }
    }

    let mut posts = page.posts;
    let mut next_href = page.next_href;

    loop {
        for row in posts {
            let post_id = row.id;
            if let Err(e) = emit_post(session, thread_id, url, row) {
                tracing::warn!("Abandoning post {}: {}", post_id, e);
            }
        }

        let Some(href) = next_href else {
            break;
        };
        let next_url = urls::join_href(session.base_url(), &href);

        let html = match session.fetch(&next_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Abandoning post listing at {}: {}", next_url, e);
                break;
            }
        };

        match extract::thread_page(&html) {
            Ok(next_page) => {
                posts = next_page.posts;
                next_href = next_page.next_href;
            }
            Err(e) => {
                tracing::warn!("Abandoning post listing at {}: {}", next_url, e);
                break;
            }
        }
    }

    Ok(())
}

fn emit_post(
    session: &ScrapeSession,
    thread_id: i64,
    thread_url: &str,
    row: PostRow,
) -> Result<()> {
    let user_id = session.resolve_author(&row.author)?;

    let (last_edited, edit_user_id) = match row.edit {
        Some(edit) => (
            Some(edit.timestamp),
            Some(session.resolve_author(&edit.editor)?),
        ),
        None => (None, None),
    };

    session.put_content(Content::Post(Post {
        id: row.id,
        thread_id,
        user_id,
        date: row.date,
        message: row.message,
        last_edited,
        edit_user_id,
        url: Some(format!("{}#post-{}", thread_url, row.id)),
    }))
}

/// Fetches the JS-rendered thread page and emits poll, options, and voters
async fn scrape_poll(session: &ScrapeSession, thread_url: &str, thread_id: i64) -> Result<()> {
    let html = session.renderer().render(thread_url).await?;
    let poll = extract::poll_content(&html, thread_id)?;

    session.put_content(Content::Poll(Poll {
        id: thread_id,
        question: poll.question,
    }))?;

    for option in poll.options {
        session.put_content(Content::PollOption(option))?;
    }

    for user_id in poll.voter_ids {
        session.put_content(Content::PollVoter(PollVoter {
            poll_id: thread_id,
            user_id,
        }))?;
    }

    Ok(())
}
