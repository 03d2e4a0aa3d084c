#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! One-shot dumps of the disaster feeds.
//!
//! ```text
//! disaster_watch_dump fetch [--out data] [--gdacs-config config/gdacs.toml]
//! disaster_watch_dump combine [--dir data]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use disaster_watch_dump::{combine_latest, dump_feeds, file_stamp, log_summaries};
use disaster_watch_feed::config::{ConfigSource, WeatherConfig};
use disaster_watch_feed::{HttpFetcher, http};

#[derive(Parser)]
#[command(
    name = "disaster_watch_dump",
    about = "Fetch disaster feeds to timestamped JSON files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch GDACS and `ReliefWeb` once and write one dump per source
    Fetch {
        /// Output directory
        #[arg(long, default_value = "data")]
        out: PathBuf,
        /// GDACS feed configuration file
        #[arg(long, env = "GDACS_CONFIG", default_value = "config/gdacs.toml")]
        gdacs_config: PathBuf,
        /// `ReliefWeb` query configuration file
        #[arg(long, env = "RELIEFWEB_CONFIG", default_value = "config/reliefweb.toml")]
        reliefweb_config: PathBuf,
        /// Upstream request timeout in seconds
        #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
        request_timeout_secs: u64,
    },
    /// Merge the newest GDACS and `ReliefWeb` dumps into one file
    Combine {
        /// Directory holding the `gdacs/` and `relief/` dumps
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let stamp = file_stamp(&chrono::Local::now());

    match cli.command {
        Commands::Fetch {
            out,
            gdacs_config,
            reliefweb_config,
            request_timeout_secs,
        } => {
            let client = http::build_client(Duration::from_secs(request_timeout_secs))?;
            let fetcher = HttpFetcher::new(
                client,
                ConfigSource::File(gdacs_config),
                ConfigSource::File(reliefweb_config),
                WeatherConfig::default(),
            );

            let report = dump_feeds(&fetcher, &out, &stamp).await;
            match fetcher.reliefweb_config() {
                Ok(config) => log_summaries(&report.disasters, &config.output),
                Err(e) => log::warn!("Skipping ReliefWeb summary: {e}"),
            }

            let mut failed = false;
            for (source, result) in [("GDACS", &report.gdacs), ("ReliefWeb", &report.reliefweb)] {
                if let Err(e) = result {
                    log::error!("{source} dump failed: {e}");
                    failed = true;
                }
            }
            if failed {
                std::process::exit(1);
            }
        }
        Commands::Combine { dir } => {
            let path = combine_latest(&dir, &stamp)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
