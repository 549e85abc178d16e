//! Topic-to-metric routing

use super::correlator::Metric;
use crate::core::constants::{
    DEFAULT_TOPIC_AIR_QUALITY, DEFAULT_TOPIC_HUMIDITY, DEFAULT_TOPIC_STATUS,
    DEFAULT_TOPIC_TEMPERATURE,
};

/// Configured channel topic names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMap {
    pub temperature: String,
    pub humidity: String,
    pub air_quality: String,
    pub status: String,
}

/// What a channel topic carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Metric(Metric),
    Status,
    Unrecognized,
}

impl TopicMap {
    /// Classify a topic; exact, case-sensitive match
    pub fn resolve(&self, topic: &str) -> TopicKind {
        if topic == self.temperature {
            TopicKind::Metric(Metric::Temperature)
        } else if topic == self.humidity {
            TopicKind::Metric(Metric::Humidity)
        } else if topic == self.air_quality {
            TopicKind::Metric(Metric::AirQuality)
        } else if topic == self.status {
            TopicKind::Status
        } else {
            TopicKind::Unrecognized
        }
    }

    /// All subscribed topic names
    pub fn names(&self) -> [&str; 4] {
        [
            &self.temperature,
            &self.humidity,
            &self.air_quality,
            &self.status,
        ]
    }
}

impl Default for TopicMap {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TOPIC_TEMPERATURE.to_string(),
            humidity: DEFAULT_TOPIC_HUMIDITY.to_string(),
            air_quality: DEFAULT_TOPIC_AIR_QUALITY.to_string(),
            status: DEFAULT_TOPIC_STATUS.to_string(),
        }
    }
}

/// Parse a metric payload. Surrounding whitespace is ignored; anything
/// other than a finite number is rejected.
pub fn parse_payload(payload: &str) -> Option<f64> {
    payload
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
