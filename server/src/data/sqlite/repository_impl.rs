//! ReadingRepository trait implementation for SQLite

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::core::constants::DEFAULT_RECENT_LIMIT;
use crate::data::error::DataError;
use crate::data::traits::ReadingRepository;
use crate::data::types::{NewReading, Reading, StatisticsWindow};

use super::SqliteService;
use super::repositories::reading;

#[async_trait]
impl ReadingRepository for SqliteService {
    async fn insert(&self, new_reading: &NewReading) -> Result<i64, DataError> {
        reading::insert_reading(self.pool(), new_reading)
            .await
            .map_err(Into::into)
    }

    async fn latest(&self) -> Result<Option<Reading>, DataError> {
        reading::latest_reading(self.pool())
            .await
            .map_err(Into::into)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<Reading>, DataError> {
        let limit = if limit == 0 { DEFAULT_RECENT_LIMIT } else { limit };
        reading::recent_readings(self.pool(), limit)
            .await
            .map_err(Into::into)
    }

    async fn by_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Reading>, DataError> {
        reading::readings_in_range(self.pool(), start, end)
            .await
            .map_err(Into::into)
    }

    async fn statistics(&self, hours: u32) -> Result<StatisticsWindow, DataError> {
        let since = window_start(Duration::try_hours(i64::from(hours)));
        reading::statistics_since(self.pool(), since)
            .await
            .map_err(Into::into)
    }

    async fn prune_older_than(&self, days: u32) -> Result<u64, DataError> {
        let cutoff = window_start(Duration::try_days(i64::from(days)));
        let deleted = reading::delete_older_than(self.pool(), cutoff).await?;
        tracing::debug!(days, deleted, "Pruned readings");
        Ok(deleted)
    }
}

/// Now minus `span`, clamped to the earliest representable instant
fn window_start(span: Option<Duration>) -> DateTime<Utc> {
    span.and_then(|span| Utc::now().checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
