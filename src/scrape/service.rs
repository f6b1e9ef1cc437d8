use std::time::Duration;

use anyhow::Result;
use tokio::time;
use tracing::{debug, error, info};

use super::Scraper;
use crate::{gym::Utilization, recent::RecentCache, store::HistoryStore};

/// Periodically scrapes the gym and publishes each reading to the recent
/// cache and the durable store.
pub struct ScrapeService<S> {
    scraper: Scraper,
    cache: RecentCache,
    store: S,
    period: Duration,
}

impl<S: HistoryStore> ScrapeService<S> {
    pub fn new(scraper: Scraper, cache: RecentCache, store: S, period: Duration) -> Self {
        Self {
            scraper,
            cache,
            store,
            period,
        }
    }

    /// Runs the scrape loop indefinitely, starting with an immediate scrape.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(self) {
        info!(period_secs = self.period.as_secs(), "Scrape loop started");
        let mut ticker = time::interval(self.period);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!(error = %format!("{e:#}"), "Scrape iteration failed");
            }
        }
    }

    /// Scrape once and publish the reading.
    ///
    /// The durable write runs on its own task: a slow or failing store never
    /// delays or prevents the cache update.
    pub async fn run_once(&self) -> Result<Utilization> {
        let utilization = self.scraper.scrape().await?;
        debug!(utilization = %utilization, "Scraped gym utilization");

        let store = self.store.clone();
        let persisted = utilization.clone();
        tokio::spawn(async move {
            if let Err(e) = store.add(std::slice::from_ref(&persisted)).await {
                error!(
                    utilization = %persisted,
                    error = %format!("{e:#}"),
                    "Failed to persist utilization"
                );
            }
        });

        self.cache.add([utilization.clone()]).await;

        Ok(utilization)
    }
}
