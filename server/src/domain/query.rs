//! Read-side query service
//!
//! Fills defaults for optional parameters and validates range bounds
//! before delegating to the store. Holds no state of its own.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::core::constants::{DEFAULT_CLEANUP_DAYS, DEFAULT_RECENT_LIMIT, DEFAULT_STATISTICS_HOURS};
use crate::data::{DataError, Reading, ReadingRepository, StatisticsWindow};

/// Naive formats accepted for range bounds, interpreted as UTC
const NAIVE_BOUND_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Please provide start and end parameters")]
    MissingRangeBound,

    #[error("Invalid {name} parameter: {value}")]
    InvalidRangeBound { name: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] DataError),
}

/// Statistics for a trailing window of `hours`
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub hours: u32,
    pub statistics: StatisticsWindow,
}

/// Outcome of a retention prune
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub days: u32,
    pub deleted: u64,
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn ReadingRepository>,
}

impl QueryService {
    pub fn new(store: Arc<dyn ReadingRepository>) -> Self {
        Self { store }
    }

    pub async fn latest(&self) -> Result<Option<Reading>, QueryError> {
        Ok(self.store.latest().await?)
    }

    /// Newest readings; missing, non-numeric or non-positive limits use the default
    pub async fn recent(&self, limit: Option<&str>) -> Result<Vec<Reading>, QueryError> {
        let limit = positive_or(limit, DEFAULT_RECENT_LIMIT);
        Ok(self.store.recent(limit).await?)
    }

    pub async fn statistics(&self, hours: Option<&str>) -> Result<StatisticsReport, QueryError> {
        let hours = positive_or(hours, DEFAULT_STATISTICS_HOURS);
        let statistics = self.store.statistics(hours).await?;
        Ok(StatisticsReport { hours, statistics })
    }

    /// Readings between two required bounds, inclusive
    pub async fn range(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<Reading>, QueryError> {
        let (Some(start), Some(end)) = (non_empty(start), non_empty(end)) else {
            return Err(QueryError::MissingRangeBound);
        };
        let start = parse_bound("start", start)?;
        let end = parse_bound("end", end)?;
        Ok(self.store.by_range(Some(start), Some(end)).await?)
    }

    pub async fn cleanup(&self, days: Option<&str>) -> Result<CleanupReport, QueryError> {
        let days = positive_or(days, DEFAULT_CLEANUP_DAYS);
        let deleted = self.store.prune_older_than(days).await?;
        tracing::info!(deleted, days, "Cleaned up old readings");
        Ok(CleanupReport { days, deleted })
    }
}

/// Parse the leading integer of a parameter (`"25abc"` is 25, `"2.5"` is 2),
/// falling back to `default` when there is none or it is not positive.
/// Values above `u32::MAX` saturate.
pub fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw.map(str::trim) else {
        return default;
    };
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    if negative || digits.is_empty() {
        return default;
    }

    // Only overflow can fail here
    let n = digits
        .parse::<u64>()
        .map_or(u32::MAX, |n| u32::try_from(n).unwrap_or(u32::MAX));
    if n == 0 { default } else { n }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an RFC 3339 timestamp or a naive `YYYY-MM-DD HH:MM[:SS]` as UTC
pub fn parse_bound(name: &'static str, value: &str) -> Result<DateTime<Utc>, QueryError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_BOUND_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| QueryError::InvalidRangeBound {
            name,
            value: value.to_string(),
        })
}
