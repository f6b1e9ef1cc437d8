use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::time;
use tracing::{error, info};

use crate::{recent::RecentCache, store::HistoryStore};

/// Periodically reloads the retention window from the durable store into
/// the recent cache, to recover after a restart or fill gaps.
///
/// Reloading only adds readings; anything already cached stays until it
/// falls out of the window.
pub struct RefreshService<S> {
    store: S,
    cache: RecentCache,
    period: Duration,
}

impl<S: HistoryStore> RefreshService<S> {
    pub fn new(store: S, cache: RecentCache, period: Duration) -> Self {
        Self {
            store,
            cache,
            period,
        }
    }

    /// Runs the refresh loop indefinitely, starting with an immediate reload.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(self) {
        info!(period_secs = self.period.as_secs(), "Refresh loop started");
        let mut ticker = time::interval(self.period);

        loop {
            ticker.tick().await;
            match self.refresh_once(Utc::now()).await {
                Ok(n) => info!(readings = n, "Recent cache refreshed from store"),
                Err(e) => error!(error = %format!("{e:#}"), "Refresh iteration failed"),
            }
        }
    }

    /// Load everything newer than `now` minus the cache retention and add it
    /// to the cache. Returns the number of readings loaded.
    pub async fn refresh_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let since = now
            .checked_sub_signed(self.cache.retention())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let data = self
            .store
            .since(since)
            .await
            .context("getting data from store")?;

        let loaded = data.len();
        self.cache.add(data).await;

        Ok(loaded)
    }
}
