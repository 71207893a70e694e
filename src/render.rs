//! JS page renderer collaborator
//!
//! Poll voter lists are client-rendered: the page the HTTP client sees has
//! an empty container that JavaScript fills in after load. The core's
//! contract with the renderer is simply "given a URL, return fully-rendered
//! HTML"; the one shipped implementation shells out to a headless browser
//! command (e.g. `chromium --headless --dump-dom`). When no renderer is
//! configured, poll scraping is skipped with a warning and the rest of the
//! thread is unaffected.

use crate::{ArchiveError, Result};

/// Renders JS-dependent pages to HTML
#[derive(Debug, Clone)]
pub enum PageRenderer {
    /// No renderer available; JS-dependent content is skipped
    Disabled,
    /// External command invoked as `<command> <url>`, printing HTML to stdout
    Command(String),
}

impl PageRenderer {
    pub fn from_config(config: &crate::config::RenderConfig) -> Self {
        match &config.command {
            Some(command) => Self::Command(command.clone()),
            None => {
                tracing::warn!("Polls cannot be scraped without a page renderer command");
                Self::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Command(_))
    }

    /// Returns the fully-rendered HTML for `url`
    pub async fn render(&self, url: &str) -> Result<String> {
        let command = match self {
            Self::Disabled => {
                return Err(ArchiveError::Render {
                    url: url.to_string(),
                    message: "no renderer configured".to_string(),
                })
            }
            Self::Command(command) => command,
        };

        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| ArchiveError::Render {
            url: url.to_string(),
            message: "empty renderer command".to_string(),
        })?;

        tracing::debug!("Rendering {} via {}", url, program);

        let output = tokio::process::Command::new(program)
            .args(parts)
            .arg(url)
            .output()
            .await
            .map_err(|e| ArchiveError::Render {
                url: url.to_string(),
                message: format!("failed to run renderer: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ArchiveError::Render {
                url: url.to_string(),
                message: format!("renderer exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;

    #[test]
    fn test_from_config() {
        let disabled = PageRenderer::from_config(&RenderConfig { command: None });
        assert!(!disabled.is_enabled());

        let enabled = PageRenderer::from_config(&RenderConfig {
            command: Some("chromium --headless --dump-dom".to_string()),
        });
        assert!(enabled.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_renderer_errors() {
        let renderer = PageRenderer::Disabled;
        let result = renderer.render("https://example.proboards.com/thread/1").await;
        assert!(matches!(result, Err(ArchiveError::Render { .. })));
    }

    #[tokio::test]
    async fn test_command_renderer_captures_stdout() {
        // `echo` stands in for a real headless browser here.
        let renderer = PageRenderer::Command("echo <html>rendered</html>".to_string());
        let html = renderer
            .render("https://example.proboards.com/thread/1")
            .await
            .unwrap();

        assert!(html.contains("<html>rendered</html>"));
    }

    #[tokio::test]
    async fn test_missing_renderer_binary_errors() {
        let renderer = PageRenderer::Command("definitely-not-a-real-binary".to_string());
        let result = renderer.render("https://example.proboards.com/thread/1").await;
        assert!(matches!(result, Err(ArchiveError::Render { .. })));
    }
}
