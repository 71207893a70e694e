//! Forum URL handling
//!
//! ProBoards page URLs take a small number of shapes, and the shape decides
//! what gets scraped:
//!
//! - Homepage: `https://yoursite.proboards.com/` (entire site)
//! - Members: `https://yoursite.proboards.com/members` (users only)
//! - User: `https://yoursite.proboards.com/user/10`
//! - Board: `https://yoursite.proboards.com/board/3/board-name`
//! - Thread: `https://yoursite.proboards.com/thread/123/thread-title`

use crate::UrlError;
use url::Url;

/// What a given input URL asks us to scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeTarget {
    /// Forum homepage: scrape the whole site (users + content)
    Forum,
    /// Members listing: scrape all users
    Members,
    /// A single user profile
    User(i64),
    /// A single board subtree (threads, posts, sub-boards)
    Board(i64),
    /// A single thread (posts, poll)
    Thread(i64),
}

/// Splits a forum page URL into the site base URL and the resource path.
///
/// The base URL (scheme + host, no trailing slash) is what relative hrefs
/// scraped from pages are joined against. The path is `None` for the
/// homepage itself.
pub fn split_url(raw: &str) -> Result<(String, Option<String>), UrlError> {
    let trimmed = raw.trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| UrlError::Parse(format!("{raw}: {e}")))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| UrlError::Parse(format!("{raw}: no host")))?;

    let base = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };

    let path = match parsed.path() {
        "" | "/" => None,
        p => Some(p.trim_end_matches('/').to_string()),
    };

    Ok((base, path))
}

/// Classifies a forum URL into a [`ScrapeTarget`] by its path shape.
pub fn classify_url(raw: &str) -> Result<ScrapeTarget, UrlError> {
    let (_, path) = split_url(raw)?;

    let path = match path {
        None => return Ok(ScrapeTarget::Forum),
        Some(p) => p,
    };

    let mut segments = path.trim_start_matches('/').split('/');
    let head = segments.next().unwrap_or("");

    match head {
        "members" => Ok(ScrapeTarget::Members),
        "user" => Ok(ScrapeTarget::User(parse_id(segments.next(), raw)?)),
        "board" => Ok(ScrapeTarget::Board(parse_id(segments.next(), raw)?)),
        "thread" => Ok(ScrapeTarget::Thread(parse_id(segments.next(), raw)?)),
        _ => Err(UrlError::Unrecognized(raw.to_string())),
    }
}

/// Extracts the numeric id segment from a `/user/{id}`-style URL.
///
/// Profile links scraped out of page markup are relative hrefs like
/// `/user/42`, so this is also used on joined URLs during traversal.
pub fn id_from_url(raw: &str) -> Result<i64, UrlError> {
    let (_, path) = split_url(raw)?;
    let path = path.ok_or_else(|| UrlError::MissingId(raw.to_string()))?;
    let mut segments = path.trim_start_matches('/').split('/');
    let _kind = segments.next();
    parse_id(segments.next(), raw)
}

fn parse_id(segment: Option<&str>, raw: &str) -> Result<i64, UrlError> {
    segment
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| UrlError::MissingId(raw.to_string()))
}

/// Joins a relative href (as found in page markup) against the site base URL.
pub fn join_href(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{base_url}{href}")
    } else {
        format!("{base_url}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_homepage() {
        let (base, path) = split_url("https://example.proboards.com/").unwrap();
        assert_eq!(base, "https://example.proboards.com");
        assert_eq!(path, None);
    }

    #[test]
    fn test_split_board_url() {
        let (base, path) = split_url("https://example.proboards.com/board/3/general").unwrap();
        assert_eq!(base, "https://example.proboards.com");
        assert_eq!(path, Some("/board/3/general".to_string()));
    }

    #[test]
    fn test_split_keeps_port() {
        let (base, _) = split_url("http://127.0.0.1:8080/members").unwrap();
        assert_eq!(base, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_classify_homepage() {
        let target = classify_url("https://example.proboards.com/").unwrap();
        assert_eq!(target, ScrapeTarget::Forum);
    }

    #[test]
    fn test_classify_members() {
        let target = classify_url("https://example.proboards.com/members").unwrap();
        assert_eq!(target, ScrapeTarget::Members);
    }

    #[test]
    fn test_classify_user() {
        let target = classify_url("https://example.proboards.com/user/10").unwrap();
        assert_eq!(target, ScrapeTarget::User(10));
    }

    #[test]
    fn test_classify_board() {
        let target = classify_url("https://example.proboards.com/board/3/general").unwrap();
        assert_eq!(target, ScrapeTarget::Board(3));
    }

    #[test]
    fn test_classify_thread() {
        let target = classify_url("https://example.proboards.com/thread/1234/some-title").unwrap();
        assert_eq!(target, ScrapeTarget::Thread(1234));
    }

    #[test]
    fn test_classify_unrecognized() {
        let result = classify_url("https://example.proboards.com/shop/7");
        assert!(matches!(result, Err(UrlError::Unrecognized(_))));
    }

    #[test]
    fn test_classify_missing_id() {
        let result = classify_url("https://example.proboards.com/user/not-a-number");
        assert!(matches!(result, Err(UrlError::MissingId(_))));
    }

    #[test]
    fn test_id_from_url() {
        assert_eq!(
            id_from_url("https://example.proboards.com/user/42").unwrap(),
            42
        );
        assert_eq!(
            id_from_url("https://example.proboards.com/thread/9/title").unwrap(),
            9
        );
    }

    #[test]
    fn test_join_href() {
        assert_eq!(
            join_href("https://example.proboards.com", "/user/5"),
            "https://example.proboards.com/user/5"
        );
        assert_eq!(
            join_href("https://example.proboards.com", "//cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(
            join_href("https://example.proboards.com", "https://other.com/x"),
            "https://other.com/x"
        );
    }
}
