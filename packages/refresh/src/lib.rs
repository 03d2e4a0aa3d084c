#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Background refresh loop.
//!
//! The [`Refresher`] polls GDACS and `ReliefWeb` every disaster interval
//! and the weather provider every weather interval, writing each success
//! into the [`SnapshotStore`]. A failed fetch is logged, reported to the
//! [`RefreshObserver`], and leaves that source's previous snapshot in
//! place. Nothing a fetch does can stop the loop; only its
//! [`ShutdownSignal`] does.

pub mod observer;
pub mod shutdown;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use disaster_watch_feed::{FeedFetcher, FetchError};
use disaster_watch_feed_models::SourceId;
use disaster_watch_store::{SnapshotStore, Slot};
use futures::FutureExt as _;
use tokio::time::Instant;

pub use observer::{NoopObserver, RefreshObserver};
pub use shutdown::{ShutdownHandle, ShutdownSignal};

/// Loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Pause between cycles; GDACS and `ReliefWeb` are fetched every cycle.
    pub disaster_interval: Duration,
    /// Minimum time between weather attempts.
    pub weather_interval: Duration,
    /// Pause after a cycle that panicked.
    pub error_backoff: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            disaster_interval: Duration::from_secs(300),
            weather_interval: Duration::from_secs(900),
            error_backoff: Duration::from_secs(60),
        }
    }
}

/// What happened to one source during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Snapshot replaced with this many records.
    Updated(usize),
    /// Fetch failed; prior snapshot kept.
    Failed,
    /// Not due this cycle.
    Skipped,
}

/// Outcome of every source in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Weather outcome.
    pub weather: SourceOutcome,
    /// GDACS outcome.
    pub gdacs: SourceOutcome,
    /// `ReliefWeb` outcome.
    pub reliefweb: SourceOutcome,
}

/// Drives the fetchers and writes results into the store.
pub struct Refresher {
    store: Arc<SnapshotStore>,
    fetcher: Arc<dyn FeedFetcher>,
    observer: Arc<dyn RefreshObserver>,
    settings: RefreshSettings,
    last_weather_attempt: Option<Instant>,
}

impl Refresher {
    /// Creates a refresher that has not fetched anything yet.
    #[must_use]
    pub fn new(
        store: Arc<SnapshotStore>,
        fetcher: Arc<dyn FeedFetcher>,
        observer: Arc<dyn RefreshObserver>,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            observer,
            settings,
            last_weather_attempt: None,
        }
    }

    /// Fetches all three sources once, regardless of schedule.
    pub async fn initial_load(&mut self) -> CycleReport {
        log::info!("Performing initial fetch of all sources");
        self.last_weather_attempt = Some(Instant::now());
        let report = CycleReport {
            weather: self.refresh_weather().await,
            gdacs: self.refresh_gdacs().await,
            reliefweb: self.refresh_reliefweb().await,
        };
        log::info!("Initial fetch finished: {report:?}");
        report
    }

    /// Runs one cycle: weather if due, then GDACS, then `ReliefWeb`.
    pub async fn run_cycle(&mut self) -> CycleReport {
        log::info!("Starting refresh cycle");

        let weather = if self.weather_due() {
            self.last_weather_attempt = Some(Instant::now());
            self.refresh_weather().await
        } else {
            log::debug!("Weather not due yet");
            SourceOutcome::Skipped
        };

        let report = CycleReport {
            weather,
            gdacs: self.refresh_gdacs().await,
            reliefweb: self.refresh_reliefweb().await,
        };
        log::info!("Refresh cycle finished: {report:?}");
        report
    }

    /// Sleeps, cycles, and repeats until `shutdown` fires.
    ///
    /// A panicking cycle is logged and followed by the error backoff
    /// instead of ending the loop.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        log::info!(
            "Refresh loop started (disasters every {:?}, weather every {:?})",
            self.settings.disaster_interval,
            self.settings.weather_interval,
        );

        loop {
            tokio::select! {
                () = shutdown.wait() => break,
                () = tokio::time::sleep(self.settings.disaster_interval) => {}
            }

            let backoff = self.settings.error_backoff;
            let cycle = AssertUnwindSafe(self.run_cycle()).catch_unwind();
            let outcome = tokio::select! {
                () = shutdown.wait() => break,
                outcome = cycle => outcome,
            };

            if let Err(panic) = outcome {
                log::error!(
                    "Refresh cycle panicked: {}; retrying in {backoff:?}",
                    panic_message(panic.as_ref())
                );
                tokio::select! {
                    () = shutdown.wait() => break,
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }

        log::info!("Refresh loop stopped");
    }

    fn weather_due(&self) -> bool {
        self.last_weather_attempt
            .is_none_or(|at| at.elapsed() >= self.settings.weather_interval)
    }

    async fn refresh_weather(&self) -> SourceOutcome {
        let started = Instant::now();
        let result = self.fetcher.fetch_weather(None).await.map(Some);
        self.settle(
            SourceId::Weather,
            started,
            result,
            &self.store.weather,
            |_| 1,
        )
    }

    async fn refresh_gdacs(&self) -> SourceOutcome {
        let started = Instant::now();
        let result = self.fetcher.fetch_alerts().await;
        self.settle(SourceId::Gdacs, started, result, &self.store.gdacs, Vec::len)
    }

    async fn refresh_reliefweb(&self) -> SourceOutcome {
        let started = Instant::now();
        let result = self.fetcher.fetch_disasters().await;
        self.settle(
            SourceId::ReliefWeb,
            started,
            result,
            &self.store.reliefweb,
            Vec::len,
        )
    }

    fn settle<T>(
        &self,
        source: SourceId,
        started: Instant,
        result: Result<T, FetchError>,
        slot: &Slot<T>,
        count: impl FnOnce(&T) -> usize,
    ) -> SourceOutcome {
        let elapsed = started.elapsed();
        match result {
            Ok(data) => {
                let records = count(&data);
                slot.set(data, Utc::now());
                log::info!("Updated {source} snapshot with {records} records in {elapsed:?}");
                self.observer.fetch_succeeded(source, records, elapsed);
                SourceOutcome::Updated(records)
            }
            Err(e) => {
                log::error!("{e} (kind={}); keeping previous snapshot", e.cause.kind());
                self.observer.fetch_failed(&e, elapsed);
                SourceOutcome::Failed
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
