//! IP geolocation of the server itself.

use disaster_watch_feed_models::Coordinates;
use serde_json::Value;

use crate::{FetchCause, http};

/// Resolves the server's position from an ipinfo-style endpoint.
///
/// # Errors
///
/// Returns [`FetchCause::Geolocation`] if the lookup fails for any
/// reason, including transport errors.
pub async fn locate(client: &reqwest::Client, url: &str) -> Result<Coordinates, FetchCause> {
    let body = http::send_json(client.get(url))
        .await
        .map_err(|e| FetchCause::Geolocation {
            message: e.to_string(),
        })?;
    parse_location(&body).ok_or_else(|| FetchCause::Geolocation {
        message: format!("no usable location in response from {url}"),
    })
}

/// Reads `loc: "lat,lng"`, or numeric `lat`/`lon` (or `latitude`/
/// `longitude`) keys.
#[must_use]
pub fn parse_location(body: &Value) -> Option<Coordinates> {
    if let Some(loc) = body.get("loc").and_then(Value::as_str) {
        let (lat, lng) = loc.split_once(',')?;
        return Some(Coordinates {
            lat: lat.trim().parse().ok()?,
            lng: lng.trim().parse().ok()?,
        });
    }
    let number = |keys: &[&str]| keys.iter().find_map(|k| body.get(*k).and_then(Value::as_f64));
    Some(Coordinates {
        lat: number(&["lat", "latitude"])?,
        lng: number(&["lon", "lng", "longitude"])?,
    })
}
