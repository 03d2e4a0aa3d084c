#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the disaster watch server.
//!
//! Every JSON body carries a `success` flag. Snake-case keys are part of
//! the public contract consumed by the dashboard frontend, except the
//! weather record which keeps the provider's camel-case `windSpeed`.

use chrono::{DateTime, Utc};
use disaster_watch_feed_models::{Coordinates, Severity, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
    /// Service version.
    pub version: String,
}

/// One source's cached records.
#[derive(Debug, Clone, Serialize)]
pub struct ApiList<T> {
    /// Always `true`.
    pub success: bool,
    /// The cached records.
    pub data: T,
    /// Number of records.
    pub count: usize,
    /// When the records were fetched; `null` before the first success.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Record counts per source in the combined view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    /// GDACS alert count.
    pub gdacs: usize,
    /// `ReliefWeb` disaster count.
    pub reliefweb: usize,
}

/// Combined, time-sorted disaster view.
#[derive(Debug, Clone, Serialize)]
pub struct ApiDisasters {
    /// Always `true`.
    pub success: bool,
    /// Events from both sources, newest first.
    pub data: Vec<DisasterEvent>,
    /// Number of events.
    pub count: usize,
    /// Per-source counts.
    pub sources: SourceCounts,
    /// Latest fetch time across both sources.
    pub last_updated: Option<DateTime<Utc>>,
}

/// A GDACS alert or `ReliefWeb` disaster in a common presentation shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterEvent {
    /// `gdacs-<guid>` or `reliefweb-<id>`, falling back to the position
    /// in the combined list.
    pub id: String,
    /// Alert level for GDACS, disaster type for `ReliefWeb`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Coarse severity.
    pub severity: Severity,
    /// Headline.
    pub title: String,
    /// At most 200 characters of the upstream description plus `...`.
    pub description: String,
    /// Country or region.
    pub location: String,
    /// Point location when the source provides one.
    pub coordinates: Option<Coordinates>,
    /// RFC 3339 when the upstream date was parseable, otherwise verbatim.
    pub timestamp: String,
    /// `"GDACS"` or `"ReliefWeb"`.
    pub source: String,
    /// Link to the upstream page, or empty.
    pub url: String,
}

/// Query parameters for `GET /weather`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherQueryParams {
    /// Latitude; parsed only when `lng` is also present.
    pub lat: Option<String>,
    /// Longitude; parsed only when `lat` is also present.
    pub lng: Option<String>,
}

/// Weather fetched on demand for caller-supplied coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct ApiWeatherAt {
    /// Always `true`.
    pub success: bool,
    /// Current conditions.
    pub data: WeatherSnapshot,
    /// The requested position.
    pub coordinates: Coordinates,
    /// Time of the fetch.
    pub timestamp: DateTime<Utc>,
}

/// Cached weather at the server's own location.
#[derive(Debug, Clone, Serialize)]
pub struct ApiWeatherCached<'a> {
    /// Always `true`.
    pub success: bool,
    /// Current conditions.
    pub data: &'a WeatherSnapshot,
    /// When the snapshot was fetched.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Counts and staleness across all sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusData {
    /// Cached GDACS alerts.
    pub gdacs_alert_count: usize,
    /// Cached `ReliefWeb` disasters.
    pub reliefweb_disaster_count: usize,
    /// Sum of both counts.
    pub total_disasters: usize,
    /// Whether a weather snapshot is cached.
    pub weather_available: bool,
    /// GDACS fetch time.
    pub gdacs_last_updated: Option<DateTime<Utc>>,
    /// `ReliefWeb` fetch time.
    pub reliefweb_last_updated: Option<DateTime<Utc>>,
    /// Latest of the two disaster fetch times.
    pub last_updated: Option<DateTime<Utc>>,
    /// Weather fetch time.
    pub last_weather_updated: Option<DateTime<Utc>>,
}

/// `GET /status` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    /// Always `true`.
    pub success: bool,
    /// Always `"operational"`.
    pub status: String,
    /// Counts and timestamps.
    pub data: StatusData,
}

/// Error body: `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Builds an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disaster_event_uses_type_key() {
        let event = DisasterEvent {
            id: "gdacs-EQ1".to_string(),
            kind: "Red".to_string(),
            severity: Severity::High,
            title: "Earthquake".to_string(),
            description: "No description available".to_string(),
            location: "Chile".to_string(),
            coordinates: None,
            timestamp: "2026-05-01T12:00:00+00:00".to_string(),
            source: "GDACS".to_string(),
            url: String::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Red");
        assert_eq!(json["severity"], "High");
        assert!(json["coordinates"].is_null());
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_value(ApiError::new("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "nope"}));
    }
}
