//! Authentication collaborator
//!
//! ProBoards logins go through a central login.proboards.com flow that needs
//! a real browser, so the core never performs the login itself. It consumes
//! an opaque set of session cookies obtained either from a TOML cookie file
//! (captured earlier) or from an external helper command that drives a
//! browser and prints the same TOML to stdout. Either way the cookies land
//! in the reqwest cookie jar and every subsequent request is authenticated.
//!
//! A login failure is fatal and is surfaced before any traversal begins:
//! when credentials were supplied, scraping without them would silently
//! miss members-only content.

use crate::{ArchiveError, Result};
use reqwest::cookie::Jar;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// One session cookie, as captured from an authenticated browser session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

#[derive(Debug, Deserialize)]
struct CookieFile {
    #[serde(rename = "cookie", default)]
    cookies: Vec<SessionCookie>,
}

/// Loads session cookies from a TOML file of `[[cookie]]` entries
pub fn load_cookie_file(path: &Path) -> Result<Vec<SessionCookie>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ArchiveError::Auth(format!("cannot read cookie file: {e}")))?;
    parse_cookie_toml(&content)
}

/// Obtains session cookies by running the configured helper command.
///
/// The helper is invoked as `<command> <home-url> <username> <password>`
/// and must print cookie TOML (`[[cookie]]` entries) on stdout. How it logs
/// in (headless browser, stored session, anything else) is its business.
pub async fn login_with_helper(
    command: &str,
    home_url: &str,
    username: &str,
    password: &str,
) -> Result<Vec<SessionCookie>> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| ArchiveError::Auth("empty auth helper command".to_string()))?;

    tracing::info!("Logging in to {} via {}", home_url, program);

    let output = tokio::process::Command::new(program)
        .args(parts)
        .arg(home_url)
        .arg(username)
        .arg(password)
        .output()
        .await
        .map_err(|e| ArchiveError::Auth(format!("failed to run auth helper: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ArchiveError::Auth(format!(
            "auth helper exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let cookies = parse_cookie_toml(&stdout)?;
    tracing::info!("Login successful ({} cookies)", cookies.len());
    Ok(cookies)
}

fn parse_cookie_toml(content: &str) -> Result<Vec<SessionCookie>> {
    let parsed: CookieFile = toml::from_str(content)
        .map_err(|e| ArchiveError::Auth(format!("invalid cookie TOML: {e}")))?;

    if parsed.cookies.is_empty() {
        return Err(ArchiveError::Auth(
            "no cookies found; login presumably failed".to_string(),
        ));
    }

    Ok(parsed.cookies)
}

/// Loads the cookies into a jar usable by the HTTP client.
///
/// Cookies without an explicit domain are pinned to the forum host.
pub fn build_cookie_jar(cookies: &[SessionCookie], base_url: &str) -> Result<Arc<Jar>> {
    let base = Url::parse(base_url)?;
    let jar = Jar::default();

    for cookie in cookies {
        let domain = match &cookie.domain {
            Some(d) => d.trim_start_matches('.').to_string(),
            None => base
                .host_str()
                .ok_or_else(|| ArchiveError::Auth(format!("no host in {base_url}")))?
                .to_string(),
        };

        let mut header = format!(
            "{}={}; Domain={}; Path={}",
            cookie.name, cookie.value, domain, cookie.path
        );
        if cookie.secure {
            header.push_str("; Secure");
        }

        let cookie_url = Url::parse(&format!("{}://{}/", base.scheme(), domain))?;
        jar.add_cookie_str(&header, &cookie_url);
    }

    Ok(Arc::new(jar))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOKIE_TOML: &str = r#"
[[cookie]]
name = "pbsession"
value = "abc123"
domain = ".proboards.com"
secure = true

[[cookie]]
name = "forum_pref"
value = "xyz"
"#;

    #[test]
    fn test_parse_cookie_toml() {
        let cookies = parse_cookie_toml(COOKIE_TOML).unwrap();

        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "pbsession");
        assert_eq!(cookies[0].value, "abc123");
        assert_eq!(cookies[0].domain.as_deref(), Some(".proboards.com"));
        assert!(cookies[0].secure);

        assert_eq!(cookies[1].name, "forum_pref");
        assert_eq!(cookies[1].path, "/");
        assert!(!cookies[1].secure);
    }

    #[test]
    fn test_empty_cookie_file_is_an_error() {
        let result = parse_cookie_toml("");
        assert!(matches!(result, Err(ArchiveError::Auth(_))));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = parse_cookie_toml("[[cookie]\nbroken");
        assert!(matches!(result, Err(ArchiveError::Auth(_))));
    }

    #[test]
    fn test_load_cookie_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(COOKIE_TOML.as_bytes()).unwrap();
        file.flush().unwrap();

        let cookies = load_cookie_file(file.path()).unwrap();
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_build_cookie_jar() {
        let cookies = parse_cookie_toml(COOKIE_TOML).unwrap();
        let jar = build_cookie_jar(&cookies, "https://example.proboards.com").unwrap();

        // The jar should serve the session cookie for forum URLs.
        use reqwest::cookie::CookieStore;
        let url = Url::parse("https://example.proboards.com/members").unwrap();
        let header = jar.cookies(&url);
        assert!(header.is_some());
        let header = header.unwrap();
        assert!(header.to_str().unwrap().contains("pbsession=abc123"));
    }
}
