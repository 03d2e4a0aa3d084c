//! Request, latency and fetch counters behind `/metrics`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use disaster_watch_feed::FetchError;
use disaster_watch_feed_models::SourceId;
use disaster_watch_refresh::RefreshObserver;

/// Upper bounds of the latency histogram, in seconds.
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Fetch result label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FetchOutcome {
    /// The snapshot was replaced.
    Success,
    /// The fetch failed and the prior snapshot was kept.
    Failure,
}

impl FetchOutcome {
    /// The `outcome` label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Cumulative-bucket latency histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Observations at or below each [`DEFAULT_BUCKETS`] bound.
    pub buckets: [u64; DEFAULT_BUCKETS.len()],
    /// Sum of observed seconds.
    pub sum: f64,
    /// Number of observations.
    pub count: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            buckets: [0; DEFAULT_BUCKETS.len()],
            sum: 0.0,
            count: 0,
        }
    }
}

impl Histogram {
    fn observe(&mut self, seconds: f64) {
        for (bound, bucket) in DEFAULT_BUCKETS.iter().zip(self.buckets.iter_mut()) {
            if seconds <= *bound {
                *bucket += 1;
            }
        }
        self.sum += seconds;
        self.count += 1;
    }
}

/// `(method, endpoint, status)`.
pub type RequestKey = (String, String, u16);

/// `(method, endpoint)`.
pub type LatencyKey = (String, String);

/// Request and fetch counters for the `/metrics` endpoint.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    requests: Mutex<BTreeMap<RequestKey, u64>>,
    latency: Mutex<BTreeMap<LatencyKey, Histogram>>,
    fetches: Mutex<BTreeMap<(SourceId, FetchOutcome), u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ServerMetrics {
    /// Empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request and adds its latency to the histogram.
    pub fn observe_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        *lock(&self.requests)
            .entry((method.to_string(), endpoint.to_string(), status))
            .or_insert(0) += 1;
        lock(&self.latency)
            .entry((method.to_string(), endpoint.to_string()))
            .or_default()
            .observe(elapsed.as_secs_f64());
    }

    /// Counts one upstream fetch attempt.
    pub fn record_fetch(&self, source: SourceId, outcome: FetchOutcome) {
        *lock(&self.fetches).entry((source, outcome)).or_insert(0) += 1;
    }

    /// Request counts by method, endpoint and status.
    #[must_use]
    pub fn requests(&self) -> BTreeMap<RequestKey, u64> {
        lock(&self.requests).clone()
    }

    /// Latency histograms by method and endpoint.
    #[must_use]
    pub fn latency(&self) -> BTreeMap<LatencyKey, Histogram> {
        lock(&self.latency).clone()
    }

    /// Fetch attempts by source and outcome.
    #[must_use]
    pub fn fetches(&self) -> BTreeMap<(SourceId, FetchOutcome), u64> {
        lock(&self.fetches).clone()
    }
}

impl RefreshObserver for ServerMetrics {
    fn fetch_succeeded(&self, source: SourceId, _records: usize, _elapsed: Duration) {
        self.record_fetch(source, FetchOutcome::Success);
    }

    fn fetch_failed(&self, error: &FetchError, _elapsed: Duration) {
        self.record_fetch(error.feed, FetchOutcome::Failure);
    }
}
