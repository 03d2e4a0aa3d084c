#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Disaster feed fetchers and field normalization.
//!
//! Three upstream sources are supported:
//!
//! - **GDACS** ([`gdacs`]): an XML/RSS alert feed, converted to a dynamic
//!   value tree by [`xml`] and reduced to a configured field list by
//!   [`normalize::normalize_alert`].
//! - **`ReliefWeb`** ([`reliefweb`]): a JSON REST catalog whose `data`
//!   array is passed through unchanged.
//! - **Weather** ([`weather`]): a by-lat-lng weather API, located via IP
//!   geolocation ([`geolocation`]) when no position is supplied.
//!
//! Every fetcher is stateless: it returns records or a [`FetchError`] and
//! never writes anywhere. The [`FeedFetcher`] trait bundles the three so
//! the refresher and the API server can be driven by fakes in tests.

pub mod config;
pub mod dynamic;
pub mod gdacs;
pub mod geolocation;
pub mod http;
pub mod normalize;
pub mod reliefweb;
pub mod weather;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_server;

use async_trait::async_trait;
use disaster_watch_feed_models::{
    Coordinates, NormalizedAlert, NormalizedDisaster, SourceId, WeatherSnapshot,
};

use crate::config::{ConfigError, ConfigSource, GdacsConfig, ReliefWebConfig, WeatherConfig};

/// Why a single fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchCause {
    /// The source's configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network failure or timeout.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status.
        status: reqwest::StatusCode,
        /// Final request URL.
        url: String,
    },

    /// The response body was not the expected XML/JSON shape.
    #[error("parse error: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },

    /// The server's own position could not be resolved.
    #[error("geolocation failed: {message}")]
    Geolocation {
        /// Description of what went wrong.
        message: String,
    },
}

impl FetchCause {
    /// Short, stable label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport(_) | Self::Status { .. } => "transport",
            Self::Parse { .. } => "parse",
            Self::Geolocation { .. } => "geolocation",
        }
    }
}

/// A failed fetch, tagged with the source that failed.
#[derive(Debug, thiserror::Error)]
#[error("{feed} fetch failed: {cause}")]
pub struct FetchError {
    /// The source being fetched.
    pub feed: SourceId,
    /// What went wrong.
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    /// Tags `cause` with `feed`.
    pub fn new(feed: SourceId, cause: impl Into<FetchCause>) -> Self {
        Self {
            feed,
            cause: cause.into(),
        }
    }
}

/// The three upstream fetches, as one injectable seam.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetches and normalizes the current GDACS alerts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] tagged [`SourceId::Gdacs`] on any failure.
    async fn fetch_alerts(&self) -> Result<Vec<NormalizedAlert>, FetchError>;

    /// Fetches the current `ReliefWeb` disasters.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] tagged [`SourceId::ReliefWeb`] on any failure.
    async fn fetch_disasters(&self) -> Result<Vec<NormalizedDisaster>, FetchError>;

    /// Fetches weather at `position`, or at the server's own location when
    /// `position` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] tagged [`SourceId::Weather`] on any failure.
    async fn fetch_weather(
        &self,
        position: Option<Coordinates>,
    ) -> Result<WeatherSnapshot, FetchError>;
}

/// [`FeedFetcher`] backed by real HTTP requests.
///
/// GDACS and `ReliefWeb` configuration is resolved on every call, so a
/// config file edited (or broken) while the server runs takes effect at
/// the next fetch and only fails that fetch.
pub struct HttpFetcher {
    client: reqwest::Client,
    gdacs: ConfigSource<GdacsConfig>,
    reliefweb: ConfigSource<ReliefWebConfig>,
    weather: WeatherConfig,
}

impl HttpFetcher {
    /// Creates a fetcher sharing one HTTP client across all sources.
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        gdacs: ConfigSource<GdacsConfig>,
        reliefweb: ConfigSource<ReliefWebConfig>,
        weather: WeatherConfig,
    ) -> Self {
        Self {
            client,
            gdacs,
            reliefweb,
            weather,
        }
    }

    /// Resolves the current `ReliefWeb` configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn reliefweb_config(&self) -> Result<ReliefWebConfig, ConfigError> {
        self.reliefweb.resolve()
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch_alerts(&self) -> Result<Vec<NormalizedAlert>, FetchError> {
        let config = self
            .gdacs
            .resolve()
            .map_err(|e| FetchError::new(SourceId::Gdacs, e))?;
        gdacs::fetch(&self.client, &config).await
    }

    async fn fetch_disasters(&self) -> Result<Vec<NormalizedDisaster>, FetchError> {
        let config = self
            .reliefweb
            .resolve()
            .map_err(|e| FetchError::new(SourceId::ReliefWeb, e))?;
        reliefweb::fetch(&self.client, &config).await
    }

    async fn fetch_weather(
        &self,
        position: Option<Coordinates>,
    ) -> Result<WeatherSnapshot, FetchError> {
        weather::fetch(&self.client, &self.weather, position).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_names_source_and_cause() {
        let err = FetchError::new(
            SourceId::ReliefWeb,
            FetchCause::Parse {
                message: "missing data".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "reliefweb fetch failed: parse error: missing data"
        );
        assert_eq!(err.cause.kind(), "parse");
    }

    #[actix_web::test]
    async fn config_error_fails_only_the_affected_source() {
        let fetcher = HttpFetcher::new(
            reqwest::Client::new(),
            ConfigSource::File("/nonexistent/gdacs.toml".into()),
            ConfigSource::Inline(ReliefWebConfig::default()),
            WeatherConfig::default(),
        );
        let err = fetcher.fetch_alerts().await.unwrap_err();
        assert_eq!(err.feed, SourceId::Gdacs);
        assert_eq!(err.cause.kind(), "config");
        assert!(fetcher.reliefweb_config().is_ok());
    }
}
