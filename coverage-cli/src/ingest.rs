//! Loading artifact text from files, stdin and URLs.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::errors::CliError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(clippy::expect_used)]
static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("valid regex")
});

#[allow(clippy::expect_used)]
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

#[allow(clippy::expect_used)]
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("valid regex"));

/// Reads a text file, or stdin when `path` is `-`.
///
/// # Errors
/// Returns an error if the source cannot be read.
pub async fn read_source(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| CliError::io(path, e))?;
        return Ok(text);
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::io(path, e))
}

/// Fetches a URL and returns its readable text.
///
/// # Errors
/// Returns an error if the request fails or the server answers with a failure status.
pub async fn fetch_url(url: &str) -> Result<String, CliError> {
    let fetch_err = |source| CliError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_err)?;
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(fetch_err)?;

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("html"));
    let body = response.text().await.map_err(fetch_err)?;
    info!(url, bytes = body.len(), "fetched artifact");

    Ok(if is_html || looks_like_html(&body) {
        html_to_text(&body)
    } else {
        body
    })
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(15).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Drops scripts, styles and tags, decodes common entities and collapses blank lines.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let without_code = SCRIPT_STYLE.replace_all(html, "");
    let text = TAG.replace_all(&without_code, "\n");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    BLANK_LINES.replace_all(&decoded, "\n").trim().to_string()
}
