//! TOML configuration for the upstream feeds.
//!
//! GDACS and `ReliefWeb` each have their own file (see `config/` at the
//! workspace root). Weather settings come from environment variables so
//! the provider key is never written to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Default Ambee by-lat-lng endpoint.
pub const DEFAULT_WEATHER_URL_TEMPLATE: &str =
    "https://api.ambeedata.com/weather/latest/by-lat-lng?lat={lat}&lng={lng}";

/// Default IP geolocation endpoint.
pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipinfo.io/json";

/// Errors from loading or validating a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for the expected shape.
    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The file parsed but its values are unusable.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

/// Reads and deserializes a TOML file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Toml`] if it does not deserialize into `T`.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// A config value that is validated after deserialization.
pub trait Validate {
    /// Checks values serde cannot express constraints for.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Where a feed's configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource<T> {
    /// Re-read from this TOML file on every resolve.
    File(PathBuf),
    /// A fixed value.
    Inline(T),
}

impl<T: DeserializeOwned + Clone + Validate> ConfigSource<T> {
    /// Produces the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be loaded or the value
    /// fails validation.
    pub fn resolve(&self) -> Result<T, ConfigError> {
        let config = match self {
            Self::File(path) => load_toml(path)?,
            Self::Inline(config) => config.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// GDACS feed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GdacsConfig {
    /// RSS feed URL.
    pub feed_url: String,
    /// Field names kept in each normalized alert, in output order.
    pub relevant_fields: Vec<String>,
    /// Maximum number of feed items normalized per fetch; `None` is
    /// unlimited.
    #[serde(default, deserialize_with = "lenient_limit")]
    pub max_alerts_to_process: Option<usize>,
}

impl Validate for GdacsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "gdacs feed_url must not be empty".to_string(),
            });
        }
        if self.relevant_fields.is_empty() {
            return Err(ConfigError::Invalid {
                message: "gdacs relevant_fields must list at least one field".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Count(i64),
    Other(toml::Value),
}

/// A non-negative integer is a limit; anything else means unlimited.
fn lenient_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    let raw = Option::<RawLimit>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawLimit::Count(n)) => match usize::try_from(n) {
            Ok(limit) => Some(limit),
            Err(_) => {
                log::warn!("max_alerts_to_process={n} is negative, processing all alerts");
                None
            }
        },
        Some(RawLimit::Other(value)) => {
            log::warn!("max_alerts_to_process={value} is not an integer, processing all alerts");
            None
        }
    })
}

/// `ReliefWeb` configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReliefWebConfig {
    /// Endpoint location.
    #[serde(default)]
    pub api: ReliefWebApi,
    /// Query parameters.
    #[serde(default)]
    pub query: ReliefWebQuery,
    /// Fields printed by the dump tool's summary.
    #[serde(default)]
    pub output: ReliefWebOutput,
}

impl Validate for ReliefWebConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "reliefweb api.host must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// `[api]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReliefWebApi {
    /// URL scheme.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// API host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Endpoint path, appended to the host.
    #[serde(default = "default_path")]
    pub path: String,
    /// Application name sent as `appname`.
    #[serde(default = "default_appname")]
    pub appname: String,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_host() -> String {
    "api.reliefweb.int".to_string()
}

fn default_path() -> String {
    "/v1/disasters".to_string()
}

fn default_appname() -> String {
    "disaster-watch".to_string()
}

impl Default for ReliefWebApi {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            path: default_path(),
            appname: default_appname(),
        }
    }
}

/// `[query]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReliefWebQuery {
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Response profile (`minimal`, `list`, `full`).
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Sort expressions, each sent as `sort[]`.
    #[serde(default)]
    pub sort: Vec<String>,
    /// Filters, each sent as `filter[field][<key>]`.
    #[serde(default)]
    pub filters: BTreeMap<String, toml::Value>,
}

const fn default_limit() -> u32 {
    20
}

fn default_profile() -> String {
    "full".to_string()
}

impl Default for ReliefWebQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            profile: default_profile(),
            sort: Vec::new(),
            filters: BTreeMap::new(),
        }
    }
}

/// `[output]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReliefWebOutput {
    /// Fields to summarize; `None` means all of them.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// Weather provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherConfig {
    /// URL with `{lat}` and `{lng}` placeholders.
    pub url_template: String,
    /// Sent as the `x-api-key` header when set.
    pub api_key: Option<String>,
    /// IP geolocation endpoint.
    pub geolocation_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_WEATHER_URL_TEMPLATE.to_string(),
            api_key: None,
            geolocation_url: DEFAULT_GEOLOCATION_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl WeatherConfig {
    /// Reads `WEATHER_API_KEY`, `WEATHER_URL_TEMPLATE` and
    /// `GEOLOCATION_URL`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = std::env::var("WEATHER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            log::warn!("WEATHER_API_KEY is not set, weather requests will be unauthenticated");
        }
        Self {
            url_template: std::env::var("WEATHER_URL_TEMPLATE")
                .unwrap_or(defaults.url_template),
            api_key,
            geolocation_url: std::env::var("GEOLOCATION_URL").unwrap_or(defaults.geolocation_url),
            timeout: defaults.timeout,
        }
    }
}
