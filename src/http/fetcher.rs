//! HTTP fetching and image downloading
//!
//! All traffic to the forum goes through a [`Fetcher`], which wraps the
//! reqwest client with the rate limiter and classifies failures. Image
//! downloads degrade gracefully: a dead image host yields metadata without a
//! file rather than an error, so avatar links can still be recorded.

use crate::config::HttpConfig;
use crate::http::RateLimiter;
use crate::model::Image;
use crate::{ArchiveError, Result};
use md5::{Digest, Md5};
use reqwest::cookie::Jar;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client used for every request
///
/// When `jar` is provided (authenticated scrape), the session cookies ride
/// along on every request, which is what unlocks members-only boards.
pub fn build_http_client(
    config: &HttpConfig,
    jar: Option<Arc<Jar>>,
) -> std::result::Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.page_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }

    builder.build()
}

/// Outcome of an image download attempt
///
/// `image.md5_hash`/`filename`/`size` are populated only when the bytes came
/// back and looked like a real image; the URL is always recorded.
#[derive(Debug)]
pub struct ImageDownload {
    /// HTTP status of the GET, if the request completed
    pub status: Option<u16>,
    /// Whether an identical file was already on disk
    pub already_on_disk: bool,
    /// Whether the downloaded bytes were a recognized image format
    pub valid: bool,
    pub image: Image,
}

/// Page fetcher shared by all traversal tasks
pub struct Fetcher {
    client: Client,
    limiter: RateLimiter,
    forum_host: Option<String>,
    image_timeout: Duration,
}

impl Fetcher {
    pub fn new(client: Client, limiter: RateLimiter, base_url: &str, config: &HttpConfig) -> Self {
        let forum_host = Url::parse(base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));

        Self {
            client,
            limiter,
            forum_host,
            image_timeout: Duration::from_secs(config.image_timeout_secs),
        }
    }

    /// Fetches a page and returns its body as HTML text.
    ///
    /// Counts against the rate limiter when the URL points at the forum.
    pub async fn get_page(&self, url: &str) -> Result<String> {
        if self.is_forum_url(url) {
            self.limiter.throttle().await;
        }

        tracing::debug!("Getting page source for {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }

    /// Attempts to download the image at `url` into `dst_dir`.
    ///
    /// The file is named after its MD5 hash with an extension matching the
    /// sniffed format (the URL's extension is not trusted). A file that
    /// already exists on disk is not rewritten. Network failures and
    /// non-image payloads are recorded in the returned metadata, never
    /// propagated as errors.
    pub async fn download_image(&self, url: &str, dst_dir: &Path) -> ImageDownload {
        // Avatar URLs are frequently protocol-relative.
        let url = if url.starts_with("//") {
            format!("https:{url}")
        } else {
            url.to_string()
        };

        if self.is_forum_url(&url) {
            self.limiter.throttle().await;
        }

        tracing::debug!("Downloading image: {}", url);

        let mut download = ImageDownload {
            status: None,
            already_on_disk: false,
            valid: false,
            image: Image {
                id: None,
                url: url.clone(),
                filename: None,
                md5_hash: None,
                size: None,
            },
        };

        let response = match self
            .client
            .get(&url)
            .timeout(self.image_timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    "Failed to download image at {}: {} \
                     (it is likely the image or server no longer exists)",
                    url,
                    e
                );
                return download;
            }
        };

        download.status = Some(response.status().as_u16());
        if response.status().as_u16() != 200 {
            return download;
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Failed to read image body from {}: {}", url, e);
                return download;
            }
        };

        // The URL's file extension doesn't necessarily match the filetype,
        // so sniff the actual bytes and name the file accordingly. Files
        // that aren't a recognized image format are skipped entirely.
        let extension = match image::guess_format(&bytes) {
            Ok(format) => format.extensions_str().first().copied(),
            Err(_) => None,
        };

        let Some(extension) = extension else {
            tracing::warn!("Downloaded file at {} is not a recognized image", url);
            return download;
        };

        download.valid = true;

        let hash = hex::encode(Md5::digest(&bytes));
        let filename = format!("{hash}.{extension}");
        let path = dst_dir.join(&filename);

        download.image.md5_hash = Some(hash);
        download.image.size = Some(bytes.len() as i64);
        download.image.filename = Some(filename);

        if tokio::fs::metadata(&path).await.is_ok() {
            download.already_on_disk = true;
        } else if let Err(e) = tokio::fs::write(&path, &bytes).await {
            tracing::warn!("Failed to write image file {}: {}", path.display(), e);
        }

        download
    }

    /// Total requests the limiter has counted (for the end-of-run summary)
    pub fn request_count(&self) -> u64 {
        self.limiter.request_count()
    }

    fn is_forum_url(&self, url: &str) -> bool {
        match (&self.forum_host, Url::parse(url)) {
            (Some(host), Ok(parsed)) => parsed.host_str() == Some(host.as_str()),
            _ => false,
        }
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> ArchiveError {
    if e.is_timeout() {
        ArchiveError::Timeout {
            url: url.to_string(),
        }
    } else {
        ArchiveError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_fetcher(base_url: &str) -> Fetcher {
        let config = HttpConfig::default();
        let client = build_http_client(&config, None).unwrap();
        Fetcher::new(client, RateLimiter::disabled(), base_url, &config)
    }

    #[test]
    fn test_build_http_client() {
        let config = HttpConfig::default();
        assert!(build_http_client(&config, None).is_ok());
    }

    #[test]
    fn test_build_http_client_with_jar() {
        let config = HttpConfig::default();
        let jar = Arc::new(Jar::default());
        assert!(build_http_client(&config, Some(jar)).is_ok());
    }

    #[test]
    fn test_is_forum_url() {
        let fetcher = test_fetcher("https://example.proboards.com");

        assert!(fetcher.is_forum_url("https://example.proboards.com/thread/1/t"));
        assert!(!fetcher.is_forum_url("https://i.imgur.com/abc.png"));
        assert!(!fetcher.is_forum_url("not a url"));
    }

    #[tokio::test]
    async fn test_download_image_unreachable_host_degrades() {
        let fetcher = test_fetcher("https://example.proboards.com");
        let dir = tempfile::tempdir().unwrap();

        // Reserved .invalid TLD; DNS resolution fails fast.
        let download = fetcher
            .download_image("http://host.invalid/missing.png", dir.path())
            .await;

        assert_eq!(download.status, None);
        assert!(!download.valid);
        assert_eq!(download.image.url, "http://host.invalid/missing.png");
        assert!(download.image.md5_hash.is_none());
        assert!(download.image.filename.is_none());
    }
}
