//! Server command-line flags, each with an environment fallback.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use disaster_watch_refresh::RefreshSettings;

/// Disaster watch API server.
#[derive(Debug, Clone, Parser)]
#[command(name = "disaster_watch_server", about = "Serve cached disaster and weather feeds")]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
    pub bind_addr: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Path prefix for the JSON API (`/metrics` is always at the root)
    #[arg(long, env = "API_PREFIX", default_value = "/api")]
    pub api_prefix: String,

    /// GDACS feed configuration file
    #[arg(long, env = "GDACS_CONFIG", default_value = "config/gdacs.toml")]
    pub gdacs_config: PathBuf,

    /// `ReliefWeb` query configuration file
    #[arg(long, env = "RELIEFWEB_CONFIG", default_value = "config/reliefweb.toml")]
    pub reliefweb_config: PathBuf,

    /// Seconds between GDACS/ReliefWeb refreshes
    #[arg(long, env = "DISASTER_INTERVAL_SECS", default_value_t = 300)]
    pub disaster_interval_secs: u64,

    /// Minimum seconds between weather refreshes
    #[arg(long, env = "WEATHER_INTERVAL_SECS", default_value_t = 900)]
    pub weather_interval_secs: u64,

    /// Upstream request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl ServerArgs {
    /// Refresh loop timing derived from the interval flags.
    #[must_use]
    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            disaster_interval: Duration::from_secs(self.disaster_interval_secs),
            weather_interval: Duration::from_secs(self.weather_interval_secs),
            ..RefreshSettings::default()
        }
    }

    /// Timeout applied to every upstream request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The API prefix with a leading slash and no trailing slash.
    #[must_use]
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}
