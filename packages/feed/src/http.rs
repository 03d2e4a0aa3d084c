//! Single-shot HTTP helpers shared by the fetchers.
//!
//! Fetchers call [`send_text`] or [`send_json`] instead of
//! `reqwest::RequestBuilder::send()` directly, so every request gets the
//! same status checking and the same diagnostic logging when a body
//! cannot be decoded. There is no retry here: a failed request fails the
//! current refresh step and the next cycle tries again.

use std::time::Duration;

use crate::FetchCause;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Builds the shared client used by all fetchers.
///
/// # Errors
///
/// Returns [`reqwest::Error`] if the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("disaster-watch/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Sends a request and returns the body as text.
///
/// # Errors
///
/// Returns [`FetchCause::Transport`] on network failure or timeout and
/// [`FetchCause::Status`] when the upstream answers with a non-2xx status.
pub async fn send_text(request: reqwest::RequestBuilder) -> Result<String, FetchCause> {
    let response = request.send().await?;

    let url = response.url().to_string();
    let status = response.status();
    if !status.is_success() {
        log::warn!("HTTP {status} from {url}");
        return Err(FetchCause::Status { status, url });
    }

    match response.text().await {
        Ok(text) => Ok(text),
        Err(e) => {
            log::error!(
                "Response body read failed.\n  \
                 url: {url}\n  \
                 status: {status}\n  \
                 error: {e}",
            );
            Err(FetchCause::Transport(e))
        }
    }
}

/// Sends a request and parses the body as JSON.
///
/// # Errors
///
/// Returns the errors of [`send_text`], plus [`FetchCause::Parse`] when
/// the body is not valid JSON.
pub async fn send_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value, FetchCause> {
    let text = send_text(request).await?;
    parse_json(&text)
}

/// Parses a JSON body, logging a preview of it on failure.
///
/// # Errors
///
/// Returns [`FetchCause::Parse`] when `text` is not valid JSON.
pub fn parse_json(text: &str) -> Result<serde_json::Value, FetchCause> {
    serde_json::from_str(text).map_err(|json_err| {
        log::error!(
            "JSON parse failed.\n  \
             received: {} bytes\n  \
             parse error: {json_err}\n  \
             body preview: {}",
            text.len(),
            preview(text),
        );
        FetchCause::Parse {
            message: format!("JSON parse failed: {json_err} (received {} bytes)", text.len()),
        }
    })
}

/// Truncates `text` to [`BODY_PREVIEW_LEN`] bytes on a char boundary.
#[must_use]
pub fn preview(text: &str) -> String {
    if text.len() <= BODY_PREVIEW_LEN {
        return text.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
