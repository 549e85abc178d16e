//! Repository trait for the reading store
//!
//! The ingestion dispatcher and the query service depend on this trait
//! rather than on the SQLite service, so either side can be exercised
//! against a substitute store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::error::DataError;
use crate::data::types::{NewReading, Reading, StatisticsWindow};

/// Durable, time-indexed reading store
#[async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Append a reading; returns the assigned id
    async fn insert(&self, reading: &NewReading) -> Result<i64, DataError>;

    /// Most recently timestamped reading
    async fn latest(&self) -> Result<Option<Reading>, DataError>;

    /// Up to `limit` readings, newest first
    async fn recent(&self, limit: u32) -> Result<Vec<Reading>, DataError>;

    /// Readings with `start <= timestamp <= end`, newest first. A missing
    /// bound is treated as unbounded on that side.
    async fn by_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Reading>, DataError>;

    /// Aggregates over the trailing `hours` ending now
    async fn statistics(&self, hours: u32) -> Result<StatisticsWindow, DataError>;

    /// Delete readings strictly older than `days` days; returns the count removed
    async fn prune_older_than(&self, days: u32) -> Result<u64, DataError>;
}
