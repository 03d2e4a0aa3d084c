//! Pure mapping from raw upstream records to normalized shapes.
//!
//! Nothing here performs I/O or fails: unexpected shapes degrade to
//! `null` fields and default values.

use disaster_watch_feed_models::{Coordinates, NormalizedAlert, Severity, WeatherSnapshot};
use serde_json::Value;

use crate::dynamic::{non_null, text_payload};

/// Namespace prefix GDACS uses for its extension elements.
const GDACS_PREFIX: &str = "gdacs:";

/// Reduces one raw feed item to the configured field list.
///
/// Every configured field appears in the result, in order; a field the
/// item lacks is `null`.
#[must_use]
pub fn normalize_alert(raw: &Value, fields: &[String]) -> NormalizedAlert {
    let Some(item) = raw.as_object() else {
        return NormalizedAlert::new(
            fields
                .iter()
                .map(|field| (field.clone(), Value::Null))
                .collect(),
        );
    };

    let prefixed = |field: &str| {
        non_null(item.get(&format!("{GDACS_PREFIX}{field}"))).or_else(|| non_null(item.get(field)))
    };

    let values = fields
        .iter()
        .map(|field| {
            let value = match field.as_str() {
                "guid" => non_null(item.get("guid")).map(text_payload),
                "population" | "vulnerability" => prefixed(field.as_str()).map(text_payload),
                "coordinates" => non_null(item.get("georss:point")).cloned(),
                other => prefixed(other).cloned(),
            };
            (field.clone(), value.unwrap_or(Value::Null))
        })
        .collect();

    NormalizedAlert::new(values)
}

/// Parses a whitespace-separated `"lat lng"` pair.
///
/// Only the first two tokens are considered; both must parse as floats.
#[must_use]
pub fn parse_coordinate_pair(text: Option<&str>) -> Option<Coordinates> {
    let mut tokens = text?.split_whitespace();
    let lat = tokens.next()?.parse::<f64>().ok()?;
    let lng = tokens.next()?.parse::<f64>().ok()?;
    Some(Coordinates { lat, lng })
}

/// Maps a GDACS alert level onto [`Severity`].
///
/// Matching is a case-insensitive substring test so `"Orange Alert"` and
/// `"RED"` both classify; anything unrecognized is [`Severity::Medium`].
#[must_use]
pub fn derive_severity(alert_level: Option<&str>) -> Severity {
    let Some(level) = alert_level else {
        return Severity::Medium;
    };
    let level = level.to_lowercase();
    if level.contains("red") {
        Severity::High
    } else if level.contains("orange") {
        Severity::Medium
    } else if level.contains("green") {
        Severity::Low
    } else {
        Severity::Medium
    }
}

/// Maps a weather provider response onto [`WeatherSnapshot`].
///
/// Reads from `raw.data` when it is an object, otherwise from the top
/// level. Each field is defaulted independently.
#[must_use]
pub fn format_weather(raw: &Value) -> WeatherSnapshot {
    let source = raw.get("data").filter(|data| data.is_object()).unwrap_or(raw);
    let defaults = WeatherSnapshot::default();
    let number = |key: &str, default: f64| source.get(key).and_then(Value::as_f64).unwrap_or(default);

    WeatherSnapshot {
        temperature: number("temperature", defaults.temperature),
        humidity: number("humidity", defaults.humidity),
        wind_speed: number("windSpeed", defaults.wind_speed),
        conditions: source
            .get("summary")
            .and_then(Value::as_str)
            .map_or(defaults.conditions, ToString::to_string),
        pressure: number("pressure", defaults.pressure),
        visibility: number("visibility", defaults.visibility),
    }
}
