#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch dumps of the disaster feeds.
//!
//! [`dump_feeds`] fetches GDACS and `ReliefWeb` once and writes each
//! result to its own timestamped file:
//!
//! ```text
//! <out>/gdacs/gdacs_alerts_relevant_<YYYYmmdd_HHMMSS>.json
//! <out>/relief/reliefweb_disasters_<YYYYmmdd_HHMMSS>.json
//! ```
//!
//! [`combine_latest`] picks the newest file of each kind and merges them
//! into `<out>/combined_disaster_data_<YYYYmmdd_HHMMSS>.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use disaster_watch_feed::config::ReliefWebOutput;
use disaster_watch_feed::reliefweb::summarize;
use disaster_watch_feed::{FeedFetcher, FetchError};
use disaster_watch_feed_models::NormalizedDisaster;
use serde::Serialize;

/// Sub-directory holding GDACS dumps.
pub const GDACS_DIR: &str = "gdacs";
/// Sub-directory holding `ReliefWeb` dumps.
pub const RELIEF_DIR: &str = "relief";
/// File name prefix of GDACS dumps.
pub const GDACS_PREFIX: &str = "gdacs_alerts_relevant_";
/// File name prefix of `ReliefWeb` dumps.
pub const RELIEF_PREFIX: &str = "reliefweb_disasters_";
/// File name prefix of combined dumps.
pub const COMBINED_PREFIX: &str = "combined_disaster_data_";

/// Errors from writing or reading dumps.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// A file or directory operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A dump could not be encoded or decoded.
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The upstream fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No dump with the expected prefix exists.
    #[error("no {prefix}*.json file in {}", dir.display())]
    MissingInput {
        /// Directory searched.
        dir: PathBuf,
        /// Expected file name prefix.
        prefix: &'static str,
    },
}

/// File-name timestamp, e.g. `20260501_120000`.
#[must_use]
pub fn file_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Writes `value` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`DumpError::Io`] if the directory or file cannot be written
/// and [`DumpError::Json`] if `value` cannot be encoded.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DumpError> {
    let io_err = |source| DumpError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let body = serde_json::to_vec_pretty(value).map_err(|source| DumpError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, body).map_err(io_err)
}

fn read_json(path: &Path) -> Result<serde_json::Value, DumpError> {
    let body = std::fs::read(path).map_err(|source| DumpError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| DumpError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// What [`dump_feeds`] wrote; each source succeeds or fails on its own.
#[derive(Debug)]
pub struct DumpReport {
    /// GDACS dump path.
    pub gdacs: Result<PathBuf, DumpError>,
    /// `ReliefWeb` dump path.
    pub reliefweb: Result<PathBuf, DumpError>,
    /// The disasters written, for summaries.
    pub disasters: Vec<NormalizedDisaster>,
}

impl DumpReport {
    /// Whether both sources were written.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.gdacs.is_ok() && self.reliefweb.is_ok()
    }
}

/// Fetches both disaster feeds once and writes a dump per source.
pub async fn dump_feeds(fetcher: &dyn FeedFetcher, out: &Path, stamp: &str) -> DumpReport {
    let gdacs = async {
        let alerts = fetcher.fetch_alerts().await?;
        let path = out
            .join(GDACS_DIR)
            .join(format!("{GDACS_PREFIX}{stamp}.json"));
        write_json(&path, &alerts)?;
        log::info!("Saved {} GDACS alerts to {}", alerts.len(), path.display());
        Ok::<_, DumpError>(path)
    }
    .await;

    let mut disasters = Vec::new();
    let reliefweb = async {
        disasters = fetcher.fetch_disasters().await?;
        let path = out
            .join(RELIEF_DIR)
            .join(format!("{RELIEF_PREFIX}{stamp}.json"));
        write_json(&path, &disasters)?;
        log::info!(
            "Saved {} ReliefWeb disasters to {}",
            disasters.len(),
            path.display()
        );
        Ok::<_, DumpError>(path)
    }
    .await;

    DumpReport {
        gdacs,
        reliefweb,
        disasters,
    }
}

/// Logs one summary block per disaster using the `[output]` field list.
pub fn log_summaries(disasters: &[NormalizedDisaster], output: &ReliefWebOutput) {
    if matches!(&output.fields, Some(fields) if fields.is_empty()) {
        log::info!("output.fields is empty, skipping ReliefWeb summary");
        return;
    }
    for disaster in disasters {
        for line in summarize(disaster, output) {
            log::info!("{line}");
        }
        log::info!("{}", "-".repeat(60));
    }
}

/// Newest `<prefix>*.json` file in `dir` by file name.
///
/// # Errors
///
/// Returns [`DumpError::Io`] if `dir` exists but cannot be listed.
pub fn find_latest(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, DumpError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(DumpError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    Ok(entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            is_json
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(prefix))
        })
        .max())
}

/// Merges the newest GDACS and `ReliefWeb` dumps under `dir` into one
/// combined file and returns its path.
///
/// # Errors
///
/// Returns [`DumpError::MissingInput`] if either kind of dump is absent,
/// or an I/O or JSON error reading the inputs or writing the output.
pub fn combine_latest(dir: &Path, stamp: &str) -> Result<PathBuf, DumpError> {
    let latest = |sub: &str, prefix: &'static str| {
        let sub_dir = dir.join(sub);
        find_latest(&sub_dir, prefix)?.ok_or(DumpError::MissingInput {
            dir: sub_dir,
            prefix,
        })
    };
    let gdacs_path = latest(GDACS_DIR, GDACS_PREFIX)?;
    let relief_path = latest(RELIEF_DIR, RELIEF_PREFIX)?;
    log::info!("Latest GDACS dump: {}", gdacs_path.display());
    log::info!("Latest ReliefWeb dump: {}", relief_path.display());

    let combined = serde_json::json!({
        "gdacs_alerts": read_json(&gdacs_path)?,
        "reliefweb_disasters": read_json(&relief_path)?,
    });

    let path = dir.join(format!("{COMBINED_PREFIX}{stamp}.json"));
    write_json(&path, &combined)?;
    log::info!("Combined dump saved to {}", path.display());
    Ok(path)
}
