//! Shared data types for the reading store and message channel

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::topics::TopicMessage;

/// Persisted sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Reading {
    /// Store-assigned, monotonically increasing
    pub id: i64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub air_quality: Option<f64>,
    /// Commit time (RFC 3339)
    pub timestamp: DateTime<Utc>,
}

/// Values for a reading about to be inserted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub air_quality: Option<f64>,
    /// Explicit commit time; `None` lets the store stamp the current time
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewReading {
    pub fn new(temperature: f64, humidity: f64, air_quality: f64) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
            air_quality: Some(air_quality),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Aggregates over a trailing time window. Every aggregate is `None` when
/// the window holds no readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct StatisticsWindow {
    pub avg_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub min_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub avg_air_quality: Option<f64>,
    pub min_air_quality: Option<f64>,
    pub max_air_quality: Option<f64>,
    pub total_records: i64,
}

/// Raw event delivered on the message channel
#[derive(Debug, Clone, PartialEq)]
pub struct SensorMessage {
    pub topic: String,
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

impl SensorMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}

impl TopicMessage for SensorMessage {
    fn size_bytes(&self) -> usize {
        // Fixed overhead covers the timestamp and String headers
        self.topic.len() + self.payload.len() + 64
    }
}
