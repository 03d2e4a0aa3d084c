//! Weather provider.

use disaster_watch_feed_models::{Coordinates, SourceId, WeatherSnapshot};

use crate::config::WeatherConfig;
use crate::normalize::format_weather;
use crate::{FetchCause, FetchError, geolocation, http};

/// Substitutes `{lat}` and `{lng}` into `template`.
#[must_use]
pub fn build_url(template: &str, position: Coordinates) -> String {
    template
        .replace("{lat}", &position.lat.to_string())
        .replace("{lng}", &position.lng.to_string())
}

/// Fetches current conditions at `position`, or at the server's own
/// geolocated position when `position` is `None`.
///
/// # Errors
///
/// Returns [`FetchError`] tagged [`SourceId::Weather`]. A geolocation
/// failure is reported before any request reaches the provider.
pub async fn fetch(
    client: &reqwest::Client,
    config: &WeatherConfig,
    position: Option<Coordinates>,
) -> Result<WeatherSnapshot, FetchError> {
    let tag = |cause: FetchCause| FetchError::new(SourceId::Weather, cause);

    let position = match position {
        Some(position) => position,
        None => geolocation::locate(client, &config.geolocation_url)
            .await
            .map_err(tag)?,
    };

    let url = build_url(&config.url_template, position);
    log::debug!("Fetching weather for ({}, {})", position.lat, position.lng);

    let mut request = client
        .get(&url)
        .timeout(config.timeout)
        .header(reqwest::header::CONTENT_TYPE, "application/json");
    if let Some(key) = &config.api_key {
        request = request.header("x-api-key", key);
    }

    let body = http::send_json(request).await.map_err(tag)?;
    Ok(format_weather(&body))
}
