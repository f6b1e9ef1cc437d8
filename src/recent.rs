use std::sync::Arc;

use chrono::TimeDelta;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::gym::Utilization;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("retention must be > 0, was {0}")]
    InvalidRetention(TimeDelta),
}

/// In-memory, chronologically sorted window of the most recent
/// `Utilization` readings.
///
/// Readings can be added in any order. Timestamps are unique: adding a
/// reading whose timestamp is already present replaces the old one. After
/// every `add`, readings older than the newest timestamp minus the
/// retention period are forgotten, so "recent" is relative to the newest
/// reading and not to the wall clock.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct RecentCache {
    retention: TimeDelta,
    inner: Arc<Mutex<Vec<Utilization>>>,
}

impl RecentCache {
    pub fn new(retention: TimeDelta) -> Result<Self, CacheError> {
        if retention <= TimeDelta::zero() {
            return Err(CacheError::InvalidRetention(retention));
        }

        Ok(Self {
            retention,
            inner: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn retention(&self) -> TimeDelta {
        self.retention
    }

    /// Add a batch of readings.
    ///
    /// Within one batch, a later element wins over an earlier one with the
    /// same timestamp. Across concurrent calls the winner is whichever call
    /// takes the lock last.
    pub async fn add<I>(&self, batch: I)
    where
        I: IntoIterator<Item = Utilization>,
    {
        let mut batch = batch.into_iter().peekable();
        if batch.peek().is_none() {
            return;
        }

        let mut data = self.inner.lock().await;
        data.extend(batch);

        // The sort must be stable: equal timestamps keep their insertion
        // order so the dedup pass below keeps the latest arrival.
        data.sort_by_key(|u| u.timestamp);

        self.trim(&mut data);
        let sorted = std::mem::take(&mut *data);
        *data = keep_last_per_timestamp(sorted);
    }

    /// Return a snapshot of the retained readings, oldest first.
    pub async fn get(&self) -> Vec<Utilization> {
        self.inner.lock().await.clone()
    }

    /// Drop the prefix older than the newest timestamp minus retention.
    /// Expects `data` sorted.
    fn trim(&self, data: &mut Vec<Utilization>) {
        let Some(newest) = data.last() else {
            return;
        };

        let Some(threshold) = newest.timestamp.checked_sub_signed(self.retention) else {
            return;
        };

        let first = data.partition_point(|u| u.timestamp < threshold);
        data.drain(..first);
    }
}

/// Collapse runs of equal timestamps into their last element.
/// Expects `data` sorted.
fn keep_last_per_timestamp(data: Vec<Utilization>) -> Vec<Utilization> {
    let mut unique: Vec<Utilization> = Vec::with_capacity(data.len());

    for u in data {
        match unique.last_mut() {
            Some(last) if last.timestamp == u.timestamp => *last = u,
            _ => unique.push(u),
        }
    }

    unique
}
