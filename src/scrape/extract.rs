//! Page-content extractors
//!
//! Pure functions from fetched HTML to typed records plus the child hrefs to
//! recurse into. Each extractor reports a missing expected element as an
//! [`ExtractError`] naming the element, so the traversal can log exactly
//! what was malformed and abandon just that branch.
//!
//! The selectors mirror ProBoards' markup: listing tables inside
//! `div.container.*` blocks, `ui-pagination` navigation bars, guest authors
//! rendered as `span.user-guest` instead of a profile link.

use crate::model::{Category, PollOption, User};
use crate::urls;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors produced while extracting records from page markup
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector: {0}")]
    Selector(&'static str),

    #[error("missing expected element: {0}")]
    Missing(&'static str),

    #[error("malformed value in {element}: {value}")]
    Malformed {
        element: &'static str,
        value: String,
    },
}

fn sel(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css))
}

fn has_class(el: &ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn text_of(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Parses a count like `"1,500"` into an integer
fn parse_count(element: &'static str, raw: &str) -> Result<i64, ExtractError> {
    raw.replace(',', "")
        .trim()
        .parse()
        .map_err(|_| ExtractError::Malformed {
            element,
            value: raw.to_string(),
        })
}

/// The author of a thread, post, or shoutbox message as it appears on the
/// page: a profile link for registered users, a bare name for guests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorRef {
    Registered(i64),
    Guest(String),
}

/// Finds the author inside an element: a `/user/{id}` link, or the
/// `user-guest` span for guests and deleted users.
fn author_in(el: &ElementRef) -> Result<AuthorRef, ExtractError> {
    let guest_sel = sel("span.user-guest")?;
    if let Some(guest) = el.select(&guest_sel).next() {
        return Ok(AuthorRef::Guest(text_of(&guest)));
    }

    let link_sel = sel("a[href*=\"/user/\"]")?;
    if let Some(link) = el.select(&link_sel).next() {
        let href = link.value().attr("href").unwrap_or_default();
        let id = urls::id_from_url(&urls::join_href("https://x.invalid", href)).map_err(|_| {
            ExtractError::Malformed {
                element: "author link",
                value: href.to_string(),
            }
        })?;
        return Ok(AuthorRef::Registered(id));
    }

    Err(ExtractError::Missing("author"))
}

/// The "next" control of a pagination bar.
///
/// Returns `None` when the control is absent, marked disabled, or carries no
/// target link; this is the uniform termination rule for every paginated
/// listing (members, threads, posts).
fn next_page_href(doc: &Html) -> Result<Option<String>, ExtractError> {
    let next_sel = sel("ul.ui-pagination li.next")?;
    let link_sel = sel("a[href]")?;

    let Some(next) = doc.select(&next_sel).next() else {
        return Ok(None);
    };

    if has_class(&next, "state-disabled") {
        return Ok(None);
    }

    Ok(next
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string))
}

// ===== Members listing =====

/// One page of the paginated member list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberListing {
    /// Relative profile hrefs (`/user/{id}`) in page order
    pub profile_hrefs: Vec<String>,
    /// Target of the enabled "next" control, if any
    pub next_href: Option<String>,
}

pub fn member_listing(html: &str) -> Result<MemberListing, ExtractError> {
    let doc = Html::parse_document(html);

    let container_sel = sel("div.container.members")?;
    let row_sel = sel("tbody tr")?;
    let link_sel = sel("a[href]")?;

    let container = doc
        .select(&container_sel)
        .next()
        .ok_or(ExtractError::Missing("members container"))?;

    let mut profile_hrefs = Vec::new();
    for row in container.select(&row_sel) {
        if let Some(href) = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            profile_hrefs.push(href.to_string());
        }
    }

    Ok(MemberListing {
        profile_hrefs,
        next_href: next_page_href(&doc)?,
    })
}

// ===== User profile =====

/// A scraped user profile plus the avatar URL found on the page
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user: User,
    pub avatar_url: Option<String>,
}

pub fn user_profile(html: &str, url: &str, id: i64) -> Result<UserProfile, ExtractError> {
    let doc = Html::parse_document(html);

    let show_user_sel = sel("div.show-user")?;
    let name_sel = sel("span.big_username")?;
    let group_sel = sel("div.name_and_group")?;
    let row_sel = sel("div.content-box tr")?;
    let cell_sel = sel("td")?;
    let abbr_sel = sel("abbr[data-timestamp]")?;
    let anchor_sel = sel("a[href]")?;
    let signature_sel = sel("div.signature")?;
    let messenger_sel = sel("div.social.messengers span.label")?;
    let avatar_sel = sel("div.avatar img[src]")?;

    let container = doc
        .select(&show_user_sel)
        .next()
        .ok_or(ExtractError::Missing("show-user container"))?;

    let name = container
        .select(&name_sel)
        .next()
        .map(|el| text_of(&el))
        .ok_or(ExtractError::Missing("big_username"))?;

    // The group name is the trailing text of the name_and_group block,
    // after the <br> separating it from the display name.
    let group = container.select(&group_sel).next().and_then(|el| {
        el.text()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != name)
            .last()
            .map(str::to_string)
    });

    let mut user = User {
        id,
        name: Some(name),
        group,
        url: Some(url.to_string()),
        ..User::default()
    };

    // The profile info table: one row per field, heading cell then value.
    for row in container.select(&row_sel) {
        let mut cells = row.select(&cell_sel);
        let (Some(heading), Some(value)) = (cells.next(), cells.next()) else {
            continue;
        };

        let heading_text = text_of(&heading);
        let heading_text = heading_text.trim_end_matches(':');

        let timestamp = value
            .select(&abbr_sel)
            .next()
            .and_then(|a| a.value().attr("data-timestamp"))
            .map(str::to_string);

        match heading_text {
            "Username" => user.username = Some(text_of(&value)),
            "Last Online" => user.last_online = timestamp,
            "Date Registered" => user.date_registered = timestamp,
            "Age" => user.age = parse_count("age", &text_of(&value)).ok(),
            "Birthday" => user.birthdate = Some(text_of(&value)),
            "Email" => user.email = Some(text_of(&value)),
            "Gender" => user.gender = Some(text_of(&value)),
            "Location" => user.location = Some(text_of(&value)),
            "Latest Status" => user.latest_status = Some(text_of(&value)),
            "Posts" => user.post_count = parse_count("post count", &text_of(&value)).ok(),
            "Web Site" => {
                if let Some(anchor) = value.select(&anchor_sel).next() {
                    user.website = Some(text_of(&anchor));
                    user.website_url = anchor.value().attr("href").map(str::to_string);
                }
            }
            _ => {}
        }
    }

    // Signature markup is preserved verbatim.
    user.signature = container
        .select(&signature_sel)
        .next()
        .map(|el| el.inner_html().trim().to_string());

    // Instant messengers: "AIM:" labels each followed by the screen name,
    // joined as "AIM:ssj_goku12;ICQ:12345".
    let messengers: Vec<String> = container
        .select(&messenger_sel)
        .filter_map(|label| {
            let screen_name = label
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .next()
                .map(|el| text_of(&el))?;
            Some(format!("{}{}", text_of(&label), screen_name))
        })
        .collect();
    if !messengers.is_empty() {
        user.instant_messengers = Some(messengers.join(";"));
    }

    let avatar_url = container
        .select(&avatar_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    Ok(UserProfile { user, avatar_url })
}

// ===== Homepage categories =====

/// A board listed on the homepage or as a sub-board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardListing {
    pub href: String,
    pub moderator_ids: Vec<i64>,
}

/// One category block on the homepage with its top-level boards
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBlock {
    pub category: Category,
    pub boards: Vec<BoardListing>,
}

pub fn homepage_categories(html: &str) -> Result<Vec<CategoryBlock>, ExtractError> {
    let doc = Html::parse_document(html);

    let anchor_sel = sel("a[name^=\"category-\"]")?;
    let title_sel = sel("div.title_wrapper")?;

    let mut blocks = Vec::new();

    for anchor in doc.select(&anchor_sel) {
        let name_attr = anchor.value().attr("name").unwrap_or_default();
        let id = name_attr
            .strip_prefix("category-")
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| ExtractError::Malformed {
                element: "category anchor",
                value: name_attr.to_string(),
            })?;

        // The category's board container is the anchor's following sibling.
        let container = anchor
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| has_class(el, "container") && has_class(el, "boards"))
            .ok_or(ExtractError::Missing("category board container"))?;

        let name = container
            .select(&title_sel)
            .next()
            .map(|el| text_of(&el))
            .ok_or(ExtractError::Missing("category title"))?;

        blocks.push(CategoryBlock {
            category: Category { id, name },
            boards: board_rows(&container)?,
        });
    }

    Ok(blocks)
}

/// Extracts board rows (href + moderator ids) from a board-listing container
fn board_rows(container: &ElementRef) -> Result<Vec<BoardListing>, ExtractError> {
    let row_sel = sel("tbody tr")?;
    let link_sel = sel("td.main span.link a[href]")?;
    let mod_sel = sel("p.moderators a[data-id]")?;

    let mut boards = Vec::new();

    for row in container.select(&row_sel) {
        let Some(href) = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };

        let moderator_ids = row
            .select(&mod_sel)
            .filter_map(|a| a.value().attr("data-id"))
            .filter_map(|id| id.parse::<i64>().ok())
            .collect();

        boards.push(BoardListing {
            href: href.to_string(),
            moderator_ids,
        });
    }

    Ok(boards)
}

// ===== Board page =====

/// A thread row in a board's thread listing
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadListing {
    pub href: String,
    pub author: AuthorRef,
    pub locked: bool,
    pub sticky: bool,
    pub announcement: bool,
    pub views: Option<i64>,
}

/// A board page: metadata (first page), sub-boards, one page of threads
#[derive(Debug, Clone, PartialEq)]
pub struct BoardPage {
    pub name: String,
    pub description: Option<String>,
    pub password_protected: bool,
    pub sub_boards: Vec<BoardListing>,
    pub threads: Vec<ThreadListing>,
    pub next_href: Option<String>,
}

pub fn board_page(html: &str) -> Result<BoardPage, ExtractError> {
    let doc = Html::parse_document(html);

    let stats_sel = sel("div.container.stats")?;
    let name_sel = sel("div.board-name")?;
    let description_sel = sel("div.board-description")?;
    let title_sel = sel("div.title-bar h2")?;

    let Some(stats) = doc.select(&stats_sel).next() else {
        // Password-protected boards render no stats block; only the board
        // name in the title bar is available.
        if html.contains("This board is password protected") {
            let name = doc
                .select(&title_sel)
                .next()
                .map(|el| text_of(&el))
                .ok_or(ExtractError::Missing("board title bar"))?;
            return Ok(BoardPage {
                name,
                description: None,
                password_protected: true,
                sub_boards: Vec::new(),
                threads: Vec::new(),
                next_href: None,
            });
        }
        return Err(ExtractError::Missing("board stats container"));
    };

    let name = stats
        .select(&name_sel)
        .next()
        .map(|el| text_of(&el))
        .ok_or(ExtractError::Missing("board name"))?;

    let description = stats
        .select(&description_sel)
        .next()
        .map(|el| text_of(&el))
        .filter(|d| !d.is_empty());

    let sub_boards = match board_container(&doc)? {
        Some(container) => board_rows(&container)?,
        None => Vec::new(),
    };

    Ok(BoardPage {
        name,
        description,
        password_protected: false,
        sub_boards,
        threads: thread_rows(&doc)?,
        next_href: next_page_href(&doc)?,
    })
}

/// Extracts just the thread rows and next link (board pages after the first)
pub fn board_thread_page(
    html: &str,
) -> Result<(Vec<ThreadListing>, Option<String>), ExtractError> {
    let doc = Html::parse_document(html);
    Ok((thread_rows(&doc)?, next_page_href(&doc)?))
}

fn board_container<'a>(doc: &'a Html) -> Result<Option<ElementRef<'a>>, ExtractError> {
    let container_sel = sel("div.container.boards")?;
    Ok(doc.select(&container_sel).next())
}

fn thread_rows(doc: &Html) -> Result<Vec<ThreadListing>, ExtractError> {
    let container_sel = sel("div.container.threads")?;
    let row_sel = sel("tbody tr.thread")?;
    let link_sel = sel("td.main span.link a[href]")?;
    let created_by_sel = sel("td.created-by")?;
    let views_sel = sel("td.views")?;

    let Some(container) = doc.select(&container_sel).next() else {
        return Ok(Vec::new());
    };

    let mut threads = Vec::new();

    for row in container.select(&row_sel) {
        let href = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or(ExtractError::Missing("thread link"))?
            .to_string();

        let created_by = row
            .select(&created_by_sel)
            .next()
            .ok_or(ExtractError::Missing("thread created-by cell"))?;

        let views = row
            .select(&views_sel)
            .next()
            .and_then(|el| parse_count("views", &text_of(&el)).ok());

        threads.push(ThreadListing {
            href,
            author: author_in(&created_by)?,
            locked: has_class(&row, "locked"),
            sticky: has_class(&row, "sticky"),
            announcement: has_class(&row, "announcement"),
            views,
        });
    }

    Ok(threads)
}

// ===== Thread page =====

/// An edit record attached to a post
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub timestamp: String,
    pub editor: AuthorRef,
}

/// One post row on a thread page
#[derive(Debug, Clone, PartialEq)]
pub struct PostRow {
    pub id: i64,
    pub author: AuthorRef,
    pub date: Option<String>,
    /// Raw message markup, preserved verbatim
    pub message: String,
    pub edit: Option<EditRecord>,
}

/// A thread page: title, whether a poll block exists, one page of posts
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadPage {
    pub title: String,
    /// The owning board's href from the breadcrumb trail (deepest entry)
    pub board_href: Option<String>,
    pub has_poll: bool,
    pub posts: Vec<PostRow>,
    pub next_href: Option<String>,
}

pub fn thread_page(html: &str) -> Result<ThreadPage, ExtractError> {
    let doc = Html::parse_document(html);

    let container_sel = sel("div.container.posts")?;
    let title_sel = sel("div.title-bar h2")?;
    let breadcrumb_sel = sel("nav.nav-tree a[href*=\"/board/\"]")?;
    let row_sel = sel("tbody tr.post")?;
    let profile_sel = sel("td.mini-profile")?;
    let time_sel = sel("abbr.time[data-timestamp]")?;
    let message_sel = sel("div.message")?;
    let edited_sel = sel("div.edited_by")?;
    let edited_time_sel = sel("abbr[data-timestamp]")?;
    let poll_sel = sel("div.container.poll")?;

    let container = doc
        .select(&container_sel)
        .next()
        .ok_or(ExtractError::Missing("posts container"))?;

    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| text_of(&el))
        .ok_or(ExtractError::Missing("thread title"))?;

    let mut posts = Vec::new();

    for row in container.select(&row_sel) {
        let id = row
            .value()
            .attr("id")
            .and_then(|id| id.strip_prefix("post-"))
            .and_then(|id| id.parse::<i64>().ok())
            .ok_or(ExtractError::Missing("post id"))?;

        let profile = row
            .select(&profile_sel)
            .next()
            .ok_or(ExtractError::Missing("post mini-profile"))?;

        let date = row
            .select(&time_sel)
            .next()
            .and_then(|a| a.value().attr("data-timestamp"))
            .map(str::to_string);

        let message = row
            .select(&message_sel)
            .next()
            .map(|el| el.inner_html().trim().to_string())
            .ok_or(ExtractError::Missing("post message"))?;

        let edit = match row.select(&edited_sel).next() {
            Some(edited) => {
                let timestamp = edited
                    .select(&edited_time_sel)
                    .next()
                    .and_then(|a| a.value().attr("data-timestamp"))
                    .map(str::to_string);
                match timestamp {
                    Some(timestamp) => Some(EditRecord {
                        timestamp,
                        editor: author_in(&edited)?,
                    }),
                    None => None,
                }
            }
            None => None,
        };

        posts.push(PostRow {
            id,
            author: author_in(&profile)?,
            date,
            message,
            edit,
        });
    }

    let board_href = doc
        .select(&breadcrumb_sel)
        .last()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    Ok(ThreadPage {
        title,
        board_href,
        has_poll: doc.select(&poll_sel).next().is_some(),
        posts,
        next_href: next_page_href(&doc)?,
    })
}

// ===== Poll =====

/// A poll as extracted from the JS-rendered thread page
#[derive(Debug, Clone, PartialEq)]
pub struct PollContent {
    pub question: String,
    pub options: Vec<PollOption>,
    /// Registered users who voted (which option is not exposed by the site)
    pub voter_ids: Vec<i64>,
}

pub fn poll_content(html: &str, poll_id: i64) -> Result<PollContent, ExtractError> {
    let doc = Html::parse_document(html);

    let container_sel = sel("div.container.poll")?;
    let question_sel = sel("h3.question")?;
    let option_sel = sel("li.option[data-id]")?;
    let option_name_sel = sel("span.name")?;
    let option_votes_sel = sel("span.votes")?;
    let voter_sel = sel("ul.voters a[data-id]")?;

    let container = doc
        .select(&container_sel)
        .next()
        .ok_or(ExtractError::Missing("poll container"))?;

    let question = container
        .select(&question_sel)
        .next()
        .map(|el| text_of(&el))
        .ok_or(ExtractError::Missing("poll question"))?;

    let mut options = Vec::new();
    for option in container.select(&option_sel) {
        let raw_id = option.value().attr("data-id").unwrap_or_default();
        let id = raw_id
            .parse::<i64>()
            .map_err(|_| ExtractError::Malformed {
                element: "poll option id",
                value: raw_id.to_string(),
            })?;

        let name = option
            .select(&option_name_sel)
            .next()
            .map(|el| text_of(&el))
            .ok_or(ExtractError::Missing("poll option name"))?;

        let votes = option
            .select(&option_votes_sel)
            .next()
            .map(|el| parse_count("poll option votes", &text_of(&el)))
            .transpose()?
            .unwrap_or(0);

        options.push(PollOption {
            id,
            poll_id,
            name,
            votes,
        });
    }

    let voter_ids = container
        .select(&voter_sel)
        .filter_map(|a| a.value().attr("data-id"))
        .filter_map(|id| id.parse::<i64>().ok())
        .collect();

    Ok(PollContent {
        question,
        options,
        voter_ids,
    })
}

// ===== Shoutbox =====

/// One shoutbox message on the homepage
#[derive(Debug, Clone, PartialEq)]
pub struct ShoutboxRow {
    pub id: i64,
    pub author: AuthorRef,
    pub date: Option<String>,
    pub message: String,
}

/// Extracts shoutbox messages from the homepage; an absent shoutbox is not
/// an error (not every forum enables it).
pub fn shoutbox_rows(html: &str) -> Result<Vec<ShoutboxRow>, ExtractError> {
    let doc = Html::parse_document(html);

    let container_sel = sel("div.container.shoutbox")?;
    let post_sel = sel("div.shoutbox-post[data-id]")?;
    let time_sel = sel("abbr.time[data-timestamp]")?;
    let message_sel = sel("div.message")?;

    let Some(container) = doc.select(&container_sel).next() else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();

    for post in container.select(&post_sel) {
        let raw_id = post.value().attr("data-id").unwrap_or_default();
        let id = raw_id
            .parse::<i64>()
            .map_err(|_| ExtractError::Malformed {
                element: "shoutbox post id",
                value: raw_id.to_string(),
            })?;

        let date = post
            .select(&time_sel)
            .next()
            .and_then(|a| a.value().attr("data-timestamp"))
            .map(str::to_string);

        let message = post
            .select(&message_sel)
            .next()
            .map(|el| text_of(&el))
            .ok_or(ExtractError::Missing("shoutbox message"))?;

        rows.push(ShoutboxRow {
            id,
            author: author_in(&post)?,
            date,
            message,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMBERS_PAGE: &str = r#"
        <html><body>
        <div class="container members">
          <table><tbody>
            <tr><td class="main"><a href="/user/1">Alice</a></td></tr>
            <tr><td class="main"><a href="/user/2">Bob</a></td></tr>
          </tbody></table>
        </div>
        <ul class="ui-pagination">
          <li class="next"><a href="/members?page=2">Next</a></li>
        </ul>
        </body></html>
    "#;

    const MEMBERS_LAST_PAGE: &str = r#"
        <html><body>
        <div class="container members">
          <table><tbody>
            <tr><td class="main"><a href="/user/3">Carol</a></td></tr>
          </tbody></table>
        </div>
        <ul class="ui-pagination">
          <li class="next state-disabled">Next</li>
        </ul>
        </body></html>
    "#;

    #[test]
    fn test_member_listing() {
        let listing = member_listing(MEMBERS_PAGE).unwrap();
        assert_eq!(listing.profile_hrefs, vec!["/user/1", "/user/2"]);
        assert_eq!(listing.next_href.as_deref(), Some("/members?page=2"));
    }

    #[test]
    fn test_member_listing_disabled_next() {
        let listing = member_listing(MEMBERS_LAST_PAGE).unwrap();
        assert_eq!(listing.profile_hrefs, vec!["/user/3"]);
        assert_eq!(listing.next_href, None);
    }

    #[test]
    fn test_member_listing_missing_container() {
        let result = member_listing("<html><body></body></html>");
        assert!(matches!(result, Err(ExtractError::Missing(_))));
    }

    const USER_PAGE: &str = r#"
        <html><body>
        <div class="show-user">
          <div class="name_and_group">
            <span class="big_username">Alice</span><br>Global Moderator
          </div>
          <div class="avatar"><img src="//storage.proboards.com/avatar/1.png"></div>
          <div class="content-box">
            <table>
              <tr><td>Username:</td><td>alice</td></tr>
              <tr><td>Last Online:</td><td><abbr data-timestamp="1600000000">Sep 2020</abbr></td></tr>
              <tr><td>Date Registered:</td><td><abbr data-timestamp="1200000000">Jan 2008</abbr></td></tr>
              <tr><td>Age:</td><td>33</td></tr>
              <tr><td>Gender:</td><td>Female</td></tr>
              <tr><td>Location:</td><td>The Moon</td></tr>
              <tr><td>Posts:</td><td>1,500</td></tr>
              <tr><td>Web Site:</td><td><a href="https://alice.example">my site</a></td></tr>
            </table>
          </div>
          <div class="content-box">
            <div class="social messengers">
              <span class="label">AIM:</span><span>alice_aim</span>
              <span class="label">ICQ:</span><span>12345</span>
            </div>
          </div>
          <div class="content-box">
            <div class="signature">Alice was <b>here</b></div>
          </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_user_profile() {
        let profile =
            user_profile(USER_PAGE, "https://example.proboards.com/user/1", 1).unwrap();

        let user = &profile.user;
        assert_eq!(user.id, 1);
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(user.group.as_deref(), Some("Global Moderator"));
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.last_online.as_deref(), Some("1600000000"));
        assert_eq!(user.date_registered.as_deref(), Some("1200000000"));
        assert_eq!(user.age, Some(33));
        assert_eq!(user.gender.as_deref(), Some("Female"));
        assert_eq!(user.location.as_deref(), Some("The Moon"));
        assert_eq!(user.post_count, Some(1500));
        assert_eq!(user.website.as_deref(), Some("my site"));
        assert_eq!(user.website_url.as_deref(), Some("https://alice.example"));
        assert_eq!(
            user.instant_messengers.as_deref(),
            Some("AIM:alice_aim;ICQ:12345")
        );
        assert_eq!(user.signature.as_deref(), Some("Alice was <b>here</b>"));
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("//storage.proboards.com/avatar/1.png")
        );
    }

    #[test]
    fn test_user_profile_missing_name() {
        let html = r#"<div class="show-user"><div class="content-box"></div></div>"#;
        let result = user_profile(html, "https://x/user/1", 1);
        assert!(matches!(
            result,
            Err(ExtractError::Missing("big_username"))
        ));
    }

    const HOMEPAGE: &str = r#"
        <html><body>
        <a name="category-2"></a>
        <div class="container boards">
          <div class="title_wrapper">General</div>
          <table><tbody>
            <tr class="board item">
              <td class="main clickable">
                <span class="link"><a href="/board/3/general">General Discussion</a></span>
                <p class="moderators"><a data-id="5">mod</a><a data-id="7">mod2</a></p>
              </td>
            </tr>
            <tr class="board item">
              <td class="main clickable">
                <span class="link"><a href="/board/4/offtopic">Off Topic</a></span>
              </td>
            </tr>
          </tbody></table>
        </div>
        <a name="category-9"></a>
        <div class="container boards">
          <div class="title_wrapper">Staff</div>
          <table><tbody>
            <tr class="board item">
              <td class="main clickable">
                <span class="link"><a href="/board/10/staff-lounge">Staff Lounge</a></span>
              </td>
            </tr>
          </tbody></table>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_homepage_categories() {
        let blocks = homepage_categories(HOMEPAGE).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].category.id, 2);
        assert_eq!(blocks[0].category.name, "General");
        assert_eq!(blocks[0].boards.len(), 2);
        assert_eq!(blocks[0].boards[0].href, "/board/3/general");
        assert_eq!(blocks[0].boards[0].moderator_ids, vec![5, 7]);
        assert!(blocks[0].boards[1].moderator_ids.is_empty());

        assert_eq!(blocks[1].category.id, 9);
        assert_eq!(blocks[1].boards[0].href, "/board/10/staff-lounge");
    }

    const BOARD_PAGE: &str = r#"
        <html><body>
        <div class="container stats">
          <div class="board-name">General Discussion</div>
          <div class="board-description">Talk about anything.</div>
        </div>
        <div class="container boards">
          <table><tbody>
            <tr class="board item">
              <td class="main clickable">
                <span class="link"><a href="/board/6/sub">Sub Board</a></span>
              </td>
            </tr>
          </tbody></table>
        </div>
        <div class="container threads">
          <table><tbody>
            <tr class="thread sticky">
              <td class="created-by"><a href="/user/4">Dana</a></td>
              <td class="main clickable"><span class="link"><a href="/thread/101/hello">Hello</a></span></td>
              <td class="views">42</td>
            </tr>
            <tr class="thread locked">
              <td class="created-by"><span class="user-guest">Anon</span></td>
              <td class="main clickable"><span class="link"><a href="/thread/102/bye">Bye</a></span></td>
              <td class="views">1,024</td>
            </tr>
          </tbody></table>
          <ul class="ui-pagination">
            <li class="next"><a href="/board/3/general?page=2">Next</a></li>
          </ul>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_board_page() {
        let page = board_page(BOARD_PAGE).unwrap();

        assert_eq!(page.name, "General Discussion");
        assert_eq!(page.description.as_deref(), Some("Talk about anything."));
        assert!(!page.password_protected);
        assert_eq!(page.sub_boards.len(), 1);
        assert_eq!(page.sub_boards[0].href, "/board/6/sub");

        assert_eq!(page.threads.len(), 2);
        assert_eq!(page.threads[0].href, "/thread/101/hello");
        assert_eq!(page.threads[0].author, AuthorRef::Registered(4));
        assert!(page.threads[0].sticky);
        assert!(!page.threads[0].locked);
        assert_eq!(page.threads[0].views, Some(42));

        assert_eq!(
            page.threads[1].author,
            AuthorRef::Guest("Anon".to_string())
        );
        assert!(page.threads[1].locked);
        assert_eq!(page.threads[1].views, Some(1024));

        assert_eq!(page.next_href.as_deref(), Some("/board/3/general?page=2"));
    }

    #[test]
    fn test_password_protected_board() {
        let html = r#"
            <html><body>
            <div class="container">
              <div class="title-bar"><h2>Secret Board</h2></div>
              <p>This board is password protected.</p>
            </div>
            </body></html>
        "#;

        let page = board_page(html).unwrap();
        assert_eq!(page.name, "Secret Board");
        assert!(page.password_protected);
        assert_eq!(page.description, None);
        assert!(page.threads.is_empty());
        assert_eq!(page.next_href, None);
    }

    #[test]
    fn test_board_page_missing_stats() {
        let result = board_page("<html><body>nothing here</body></html>");
        assert!(matches!(
            result,
            Err(ExtractError::Missing("board stats container"))
        ));
    }

    const THREAD_PAGE: &str = r#"
        <html><body>
        <nav class="nav-tree">
          <a href="/">Home</a>
          <a href="/board/3/general">General Discussion</a>
        </nav>
        <div class="container posts">
          <div class="title-bar"><h2>Hello</h2></div>
          <table><tbody>
            <tr class="post" id="post-101">
              <td class="mini-profile"><a class="user-link" href="/user/4">Dana</a></td>
              <td class="content">
                <abbr class="time" data-timestamp="1000">then</abbr>
                <div class="message">First <b>post</b></div>
              </td>
            </tr>
            <tr class="post" id="post-102">
              <td class="mini-profile"><span class="user-guest">Anon</span></td>
              <td class="content">
                <abbr class="time" data-timestamp="2000">later</abbr>
                <div class="message">Reply</div>
                <div class="edited_by">
                  <abbr data-timestamp="3000">even later</abbr>
                  <a href="/user/5">Eve</a>
                </div>
              </td>
            </tr>
          </tbody></table>
          <ul class="ui-pagination">
            <li class="next state-disabled">Next</li>
          </ul>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_thread_page() {
        let page = thread_page(THREAD_PAGE).unwrap();

        assert_eq!(page.title, "Hello");
        assert_eq!(page.board_href.as_deref(), Some("/board/3/general"));
        assert!(!page.has_poll);
        assert_eq!(page.next_href, None);

        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0].id, 101);
        assert_eq!(page.posts[0].author, AuthorRef::Registered(4));
        assert_eq!(page.posts[0].date.as_deref(), Some("1000"));
        assert_eq!(page.posts[0].message, "First <b>post</b>");
        assert!(page.posts[0].edit.is_none());

        assert_eq!(page.posts[1].id, 102);
        assert_eq!(page.posts[1].author, AuthorRef::Guest("Anon".to_string()));
        let edit = page.posts[1].edit.as_ref().unwrap();
        assert_eq!(edit.timestamp, "3000");
        assert_eq!(edit.editor, AuthorRef::Registered(5));
    }

    const POLL_PAGE: &str = r#"
        <html><body>
        <div class="container posts">
          <div class="title-bar"><h2>Poll thread</h2></div>
          <table><tbody></tbody></table>
        </div>
        <div class="container poll">
          <h3 class="question">Favorite color?</h3>
          <ul class="options">
            <li class="option" data-id="100"><span class="name">Red</span><span class="votes">3</span></li>
            <li class="option" data-id="101"><span class="name">Blue</span><span class="votes">5</span></li>
          </ul>
          <ul class="voters">
            <li><a data-id="4">Dana</a></li>
            <li><a data-id="5">Eve</a></li>
          </ul>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_thread_page_detects_poll() {
        let page = thread_page(POLL_PAGE).unwrap();
        assert!(page.has_poll);
    }

    #[test]
    fn test_poll_content() {
        let poll = poll_content(POLL_PAGE, 77).unwrap();

        assert_eq!(poll.question, "Favorite color?");
        assert_eq!(poll.options.len(), 2);
        assert_eq!(poll.options[0].id, 100);
        assert_eq!(poll.options[0].poll_id, 77);
        assert_eq!(poll.options[0].name, "Red");
        assert_eq!(poll.options[0].votes, 3);
        assert_eq!(poll.voter_ids, vec![4, 5]);
    }

    #[test]
    fn test_poll_content_missing() {
        let result = poll_content("<html></html>", 1);
        assert!(matches!(
            result,
            Err(ExtractError::Missing("poll container"))
        ));
    }

    const SHOUTBOX_PAGE: &str = r#"
        <html><body>
        <div class="container shoutbox">
          <div class="shoutbox-post" data-id="9001">
            <a class="user-link" href="/user/4">Dana</a>
            <abbr class="time" data-timestamp="1234">then</abbr>
            <div class="message">hi all</div>
          </div>
          <div class="shoutbox-post" data-id="9002">
            <span class="user-guest">Anon</span>
            <abbr class="time" data-timestamp="1300">later</abbr>
            <div class="message">hello</div>
          </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_shoutbox_rows() {
        let rows = shoutbox_rows(SHOUTBOX_PAGE).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 9001);
        assert_eq!(rows[0].author, AuthorRef::Registered(4));
        assert_eq!(rows[0].date.as_deref(), Some("1234"));
        assert_eq!(rows[0].message, "hi all");
        assert_eq!(rows[1].author, AuthorRef::Guest("Anon".to_string()));
    }

    #[test]
    fn test_shoutbox_absent_is_empty() {
        let rows = shoutbox_rows("<html><body></body></html>").unwrap();
        assert!(rows.is_empty());
    }
}
