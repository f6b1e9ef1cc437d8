use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{gym::Utilization, recent::RecentCache};

/// Durable history of `Utilization` readings.
///
/// The sampler writes through it and the refresher reads from it, so both
/// can be exercised against an in-memory fake.
pub trait HistoryStore: Clone + Send + Sync + 'static {
    /// Persist a batch of readings. A reading with an already stored
    /// timestamp replaces the stored one.
    fn add(&self, batch: &[Utilization]) -> impl Future<Output = Result<()>> + Send;

    /// All stored readings with a timestamp at or after `since`, oldest first.
    fn since(&self, since: DateTime<Utc>) -> impl Future<Output = Result<Vec<Utilization>>> + Send;
}

/// Read side of the recent readings, as seen by the dashboard.
pub trait RecentReader: Clone + Send + Sync + 'static {
    /// Current readings, oldest first. Empty when there is no data yet.
    fn get(&self) -> impl Future<Output = Vec<Utilization>> + Send;
}

impl RecentReader for RecentCache {
    async fn get(&self) -> Vec<Utilization> {
        RecentCache::get(self).await
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use anyhow::anyhow;
    use tokio::sync::Mutex;

    use super::*;

    /// In-memory `HistoryStore` that can be switched into a failing mode.
    #[derive(Clone, Default)]
    pub(crate) struct FakeStore {
        rows: Arc<Mutex<Vec<Utilization>>>,
        failing: Arc<AtomicBool>,
    }

    impl FakeStore {
        pub(crate) fn with_rows(rows: Vec<Utilization>) -> Self {
            let store = Self::default();
            store.rows.try_lock().unwrap().extend(rows);
            store
        }

        pub(crate) fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub(crate) async fn rows(&self) -> Vec<Utilization> {
            self.rows.lock().await.clone()
        }
    }

    impl HistoryStore for FakeStore {
        async fn add(&self, batch: &[Utilization]) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(anyhow!("store unavailable"));
            }
            self.rows.lock().await.extend_from_slice(batch);
            Ok(())
        }

        async fn since(&self, since: DateTime<Utc>) -> Result<Vec<Utilization>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(anyhow!("store unavailable"));
            }
            let mut rows: Vec<_> = self
                .rows
                .lock()
                .await
                .iter()
                .filter(|u| u.timestamp >= since)
                .cloned()
                .collect();
            rows.sort_by_key(|u| u.timestamp);
            Ok(rows)
        }
    }
}
