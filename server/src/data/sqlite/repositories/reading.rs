//! Reading repository for SQLite operations
//!
//! Timestamps are stored as UTC microseconds. Ordering ties on equal
//! timestamps are broken by id so results are deterministic.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{NewReading, Reading, StatisticsWindow};

type ReadingTuple = (i64, Option<f64>, Option<f64>, Option<f64>, i64);

type StatisticsTuple = (
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    i64,
);

fn to_reading((id, temperature, humidity, air_quality, timestamp): ReadingTuple) -> Reading {
    Reading {
        id,
        temperature,
        humidity,
        air_quality,
        timestamp: DateTime::from_timestamp_micros(timestamp).unwrap_or_default(),
    }
}

/// Insert a reading and return its id. Uses the current time when the
/// reading carries no timestamp.
pub async fn insert_reading(pool: &SqlitePool, reading: &NewReading) -> Result<i64, SqliteError> {
    let timestamp = reading.timestamp.unwrap_or_else(Utc::now).timestamp_micros();

    let result = sqlx::query(
        "INSERT INTO readings (temperature, humidity, air_quality, timestamp) VALUES (?, ?, ?, ?)",
    )
    .bind(reading.temperature)
    .bind(reading.humidity)
    .bind(reading.air_quality)
    .bind(timestamp)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recently timestamped reading
pub async fn latest_reading(pool: &SqlitePool) -> Result<Option<Reading>, SqliteError> {
    let row = sqlx::query_as::<_, ReadingTuple>(
        "SELECT id, temperature, humidity, air_quality, timestamp FROM readings ORDER BY timestamp DESC, id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(to_reading))
}

/// Up to `limit` readings, newest first
pub async fn recent_readings(pool: &SqlitePool, limit: u32) -> Result<Vec<Reading>, SqliteError> {
    let rows = sqlx::query_as::<_, ReadingTuple>(
        "SELECT id, temperature, humidity, air_quality, timestamp FROM readings ORDER BY timestamp DESC, id DESC LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(to_reading).collect())
}

/// Readings with `start <= timestamp <= end`, newest first. Missing bounds are open.
pub async fn readings_in_range(
    pool: &SqlitePool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<Reading>, SqliteError> {
    let start = start.map_or(i64::MIN, |t| t.timestamp_micros());
    let end = end.map_or(i64::MAX, |t| t.timestamp_micros());

    let rows = sqlx::query_as::<_, ReadingTuple>(
        "SELECT id, temperature, humidity, air_quality, timestamp FROM readings WHERE timestamp >= ? AND timestamp <= ? ORDER BY timestamp DESC, id DESC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(to_reading).collect())
}

/// Aggregates over readings at or after `since`
pub async fn statistics_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<StatisticsWindow, SqliteError> {
    let (
        avg_temp,
        min_temp,
        max_temp,
        avg_humidity,
        min_humidity,
        max_humidity,
        avg_air_quality,
        min_air_quality,
        max_air_quality,
        total_records,
    ) = sqlx::query_as::<_, StatisticsTuple>(
        r#"
        SELECT
            AVG(temperature), MIN(temperature), MAX(temperature),
            AVG(humidity), MIN(humidity), MAX(humidity),
            AVG(air_quality), MIN(air_quality), MAX(air_quality),
            COUNT(*)
        FROM readings
        WHERE timestamp >= ?
        "#,
    )
    .bind(since.timestamp_micros())
    .fetch_one(pool)
    .await?;

    Ok(StatisticsWindow {
        avg_temp,
        min_temp,
        max_temp,
        avg_humidity,
        min_humidity,
        max_humidity,
        avg_air_quality,
        min_air_quality,
        max_air_quality,
        total_records,
    })
}

/// Delete readings strictly before `cutoff`; returns rows removed
pub async fn delete_older_than(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> Result<u64, SqliteError> {
    let result = sqlx::query("DELETE FROM readings WHERE timestamp < ?")
        .bind(cutoff.timestamp_micros())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
