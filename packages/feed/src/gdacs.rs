//! GDACS RSS alert feed.

use disaster_watch_feed_models::{NormalizedAlert, SourceId};
use serde_json::Value;

use crate::config::GdacsConfig;
use crate::dynamic::{get_path, into_list};
use crate::normalize::normalize_alert;
use crate::{FetchCause, FetchError, http, xml};

/// Fetches the feed and normalizes each item.
///
/// # Errors
///
/// Returns [`FetchError`] tagged [`SourceId::Gdacs`] on transport errors,
/// non-2xx responses, or an unparseable document.
pub async fn fetch(
    client: &reqwest::Client,
    config: &GdacsConfig,
) -> Result<Vec<NormalizedAlert>, FetchError> {
    let tag = |cause: FetchCause| FetchError::new(SourceId::Gdacs, cause);

    log::debug!("Fetching GDACS feed from {}", config.feed_url);
    let body = http::send_text(client.get(&config.feed_url))
        .await
        .map_err(tag)?;
    let alerts = parse_feed(&body, config).map_err(tag)?;
    log::debug!("Parsed {} GDACS alerts", alerts.len());
    Ok(alerts)
}

/// Parses a feed document and normalizes its items.
///
/// # Errors
///
/// Returns [`FetchCause::Parse`] if the document is not well-formed XML.
pub fn parse_feed(body: &str, config: &GdacsConfig) -> Result<Vec<NormalizedAlert>, FetchCause> {
    let tree = xml::parse(body).map_err(|e| {
        log::error!("GDACS body preview: {}", http::preview(body));
        FetchCause::Parse {
            message: e.to_string(),
        }
    })?;

    let items = alert_items(&tree);
    let limit = config.max_alerts_to_process.unwrap_or(usize::MAX);
    if items.len() > limit {
        log::info!("Processing {limit} of {} GDACS items", items.len());
    }

    Ok(items
        .into_iter()
        .take(limit)
        .map(|item| normalize_alert(item, &config.relevant_fields))
        .collect())
}

/// Items at `rss/channel/item`, coerced to a list.
#[must_use]
pub fn alert_items(tree: &Value) -> Vec<&Value> {
    into_list(get_path(tree, &["rss", "channel", "item"]))
}
