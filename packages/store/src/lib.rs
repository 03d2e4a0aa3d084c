#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Latest-snapshot cache shared by the refresher and the API server.
//!
//! Each source has its own [`Slot`]: a lock around an `Arc` holding the
//! data together with its fetch timestamp. Writers swap the `Arc`;
//! readers clone it. Locks are held only for that pointer operation, so
//! a reader keeps a consistent snapshot for as long as it likes without
//! blocking the next refresh.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use disaster_watch_feed_models::{NormalizedAlert, NormalizedDisaster, WeatherSnapshot};

/// One source's data and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Last successfully fetched data.
    pub data: T,
    /// When `data` was fetched; `None` until the first success.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T: Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            fetched_at: None,
        }
    }
}

/// An atomically replaceable snapshot.
#[derive(Debug)]
pub struct Slot<T> {
    current: RwLock<Arc<Snapshot<T>>>,
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }
}

impl<T> Slot<T> {
    /// The current snapshot.
    ///
    /// A writer that panicked mid-swap cannot leave a torn value, so a
    /// poisoned lock is read through.
    #[must_use]
    pub fn get(&self) -> Arc<Snapshot<T>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the snapshot wholesale.
    pub fn set(&self, data: T, fetched_at: DateTime<Utc>) {
        let next = Arc::new(Snapshot {
            data,
            fetched_at: Some(fetched_at),
        });
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// The process-wide cache: one slot per upstream source.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    /// Normalized GDACS alerts.
    pub gdacs: Slot<Vec<NormalizedAlert>>,
    /// `ReliefWeb` disasters.
    pub reliefweb: Slot<Vec<NormalizedDisaster>>,
    /// Weather at the server's own location.
    pub weather: Slot<Option<WeatherSnapshot>>,
}

impl SnapshotStore {
    /// An empty store, as at process start.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest fetch time across GDACS and `ReliefWeb`.
    #[must_use]
    pub fn disasters_last_updated(&self) -> Option<DateTime<Utc>> {
        self.gdacs
            .get()
            .fetched_at
            .max(self.reliefweb.get().fetched_at)
    }
}
