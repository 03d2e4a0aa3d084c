//! Hooks for reporting fetch outcomes out of the refresh loop.

use std::time::Duration;

use disaster_watch_feed::FetchError;
use disaster_watch_feed_models::SourceId;

/// Receives one call per fetch attempt made by the refresher.
///
/// Both methods default to doing nothing, so implementors only override
/// what they record.
pub trait RefreshObserver: Send + Sync {
    /// `source` was fetched and its snapshot replaced with `records` items.
    fn fetch_succeeded(&self, source: SourceId, records: usize, elapsed: Duration) {
        let _ = (source, records, elapsed);
    }

    /// A fetch failed; the prior snapshot was kept.
    fn fetch_failed(&self, error: &FetchError, elapsed: Duration) {
        let _ = (error, elapsed);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RefreshObserver for NoopObserver {}
