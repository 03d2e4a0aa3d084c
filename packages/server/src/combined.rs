//! The combined `/disasters` view over both disaster feeds.

use chrono::{DateTime, Utc};
use disaster_watch_feed::dynamic::{as_text, get_path};
use disaster_watch_feed::normalize::{derive_severity, parse_coordinate_pair};
use disaster_watch_feed_models::{NormalizedAlert, NormalizedDisaster, Severity};
use disaster_watch_server_models::DisasterEvent;
use disaster_watch_store::Snapshot;

/// Maximum description length in characters before `...` is appended.
const DESCRIPTION_LIMIT: usize = 200;

const NO_DESCRIPTION: &str = "No description available";
const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Builds the combined view: GDACS events, then `ReliefWeb` events, then
/// a stable sort by timestamp, newest first.
#[must_use]
pub fn combine(
    gdacs: &Snapshot<Vec<NormalizedAlert>>,
    reliefweb: &Snapshot<Vec<NormalizedDisaster>>,
    now: DateTime<Utc>,
) -> Vec<DisasterEvent> {
    let gdacs_fallback = gdacs.fetched_at.unwrap_or(now).to_rfc3339();
    let reliefweb_fallback = reliefweb.fetched_at.unwrap_or(now).to_rfc3339();

    let mut events: Vec<DisasterEvent> = gdacs
        .data
        .iter()
        .enumerate()
        .map(|(index, alert)| from_alert(alert, index, &gdacs_fallback))
        .collect();

    let offset = events.len();
    events.extend(
        reliefweb
            .data
            .iter()
            .enumerate()
            .map(|(index, disaster)| from_disaster(disaster, offset + index, &reliefweb_fallback)),
    );

    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

fn alert_text(alert: &NormalizedAlert, field: &str) -> Option<String> {
    alert.get(field).and_then(as_text)
}

fn from_alert(alert: &NormalizedAlert, index: usize, fallback: &str) -> DisasterEvent {
    let alert_level = alert_text(alert, "alertlevel");
    let timestamp = alert_text(alert, "pubDate").map_or_else(
        || fallback.to_string(),
        |date| {
            DateTime::parse_from_rfc2822(&date)
                .map_or(date, |parsed| parsed.with_timezone(&Utc).to_rfc3339())
        },
    );

    DisasterEvent {
        id: format!(
            "gdacs-{}",
            alert_text(alert, "guid").unwrap_or_else(|| index.to_string())
        ),
        severity: derive_severity(alert_level.as_deref()),
        kind: alert_level.unwrap_or_else(|| "Unknown".to_string()),
        title: alert_text(alert, "title").unwrap_or_else(|| "GDACS Alert".to_string()),
        description: truncate_description(alert_text(alert, "description").as_deref()),
        location: alert_text(alert, "country").unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        coordinates: parse_coordinate_pair(alert.get_str("coordinates")),
        timestamp,
        source: "GDACS".to_string(),
        url: alert_text(alert, "link").unwrap_or_default(),
    }
}

fn from_disaster(disaster: &NormalizedDisaster, index: usize, fallback: &str) -> DisasterEvent {
    let created = get_path(disaster.raw(), &["fields", "date", "created"]).and_then(as_text);

    DisasterEvent {
        id: format!(
            "reliefweb-{}",
            disaster.id().unwrap_or_else(|| index.to_string())
        ),
        kind: disaster
            .first_name_of("type")
            .unwrap_or("Disaster")
            .to_string(),
        severity: Severity::Medium,
        title: disaster
            .field_str("name")
            .unwrap_or("Disaster Alert")
            .to_string(),
        description: truncate_description(disaster.field_str("description")),
        location: disaster
            .first_name_of("country")
            .unwrap_or(UNKNOWN_LOCATION)
            .to_string(),
        coordinates: None,
        timestamp: created.unwrap_or_else(|| fallback.to_string()),
        source: "ReliefWeb".to_string(),
        url: disaster.field_str("url_alias").unwrap_or_default().to_string(),
    }
}

fn truncate_description(description: Option<&str>) -> String {
    match description {
        Some(text) if !text.is_empty() => {
            let head: String = text.chars().take(DESCRIPTION_LIMIT).collect();
            format!("{head}...")
        }
        _ => NO_DESCRIPTION.to_string(),
    }
}
