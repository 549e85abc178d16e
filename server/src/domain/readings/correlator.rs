//! Reading correlator
//!
//! Temperature, humidity and air quality arrive as independent messages.
//! The correlator keeps the latest value of each and yields a complete
//! reading once all three are known. Field updates and the completeness
//! check happen under one lock, so concurrent callers can neither lose an
//! update nor emit the same completion twice.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::types::NewReading;

/// What happens to the pending values after a complete reading is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Keep all values; every later update emits a new reading
    #[default]
    LatestSnapshot,
    /// Clear all values; the next reading needs a fresh triple
    ResetAfterEmit,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::LatestSnapshot => "latest-snapshot",
            MergePolicy::ResetAfterEmit => "reset-after-emit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
    AirQuality,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::AirQuality => "air_quality",
        }
    }
}

/// Values collected so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PendingCorrelation {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub air_quality: Option<f64>,
    /// Time of the most recent metric update
    pub last_update: Option<DateTime<Utc>>,
}

impl PendingCorrelation {
    fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::Temperature => &mut self.temperature,
            Metric::Humidity => &mut self.humidity,
            Metric::AirQuality => &mut self.air_quality,
        };
        *slot = Some(value);
    }

    fn clear_values(&mut self) {
        self.temperature = None;
        self.humidity = None;
        self.air_quality = None;
    }
}

/// A fully populated reading ready to be stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteReading {
    pub temperature: f64,
    pub humidity: f64,
    pub air_quality: f64,
    /// Arrival time of the update that completed the reading
    pub observed_at: DateTime<Utc>,
}

impl From<CompleteReading> for NewReading {
    /// The store stamps the commit time
    fn from(reading: CompleteReading) -> Self {
        NewReading::new(reading.temperature, reading.humidity, reading.air_quality)
    }
}

pub struct ReadingCorrelator {
    pending: Mutex<PendingCorrelation>,
    policy: MergePolicy,
}

impl ReadingCorrelator {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            pending: Mutex::new(PendingCorrelation::default()),
            policy,
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Record `value` for `metric`, overwriting any earlier value. Returns a
    /// complete reading when all three metrics are now present.
    pub fn apply_metric(
        &self,
        metric: Metric,
        value: f64,
        observed_at: DateTime<Utc>,
    ) -> Option<CompleteReading> {
        let mut pending = self.pending.lock();
        pending.set(metric, value);
        pending.last_update = Some(observed_at);

        let (Some(temperature), Some(humidity), Some(air_quality)) =
            (pending.temperature, pending.humidity, pending.air_quality)
        else {
            return None;
        };

        if self.policy == MergePolicy::ResetAfterEmit {
            pending.clear_values();
        }

        Some(CompleteReading {
            temperature,
            humidity,
            air_quality,
            observed_at,
        })
    }

    /// Copy of the current pending values
    pub fn snapshot(&self) -> PendingCorrelation {
        self.pending.lock().clone()
    }
}

impl Default for ReadingCorrelator {
    fn default() -> Self {
        Self::new(MergePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::AirQuality];

    fn value_for(metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => 21.5,
            Metric::Humidity => 48.0,
            Metric::AirQuality => 0.9,
        }
    }

    fn permutations() -> Vec<[Metric; 3]> {
        let [a, b, c] = ALL;
        vec![
            [a, b, c],
            [a, c, b],
            [b, a, c],
            [b, c, a],
            [c, a, b],
            [c, b, a],
        ]
    }

    #[test]
    fn test_any_arrival_order_emits_once_on_third_metric() {
        for order in permutations() {
            let correlator = ReadingCorrelator::default();
            let now = Utc::now();

            assert!(correlator.apply_metric(order[0], value_for(order[0]), now).is_none());
            assert!(correlator.apply_metric(order[1], value_for(order[1]), now).is_none());
            let reading = correlator
                .apply_metric(order[2], value_for(order[2]), now)
                .expect("third metric completes the reading");

            assert_eq!(reading.temperature, 21.5);
            assert_eq!(reading.humidity, 48.0);
            assert_eq!(reading.air_quality, 0.9);
            assert_eq!(reading.observed_at, now);
        }
    }

    #[test]
    fn test_repeated_metric_overwrites() {
        let correlator = ReadingCorrelator::default();
        let now = Utc::now();

        assert!(correlator.apply_metric(Metric::Temperature, 10.0, now).is_none());
        assert!(correlator.apply_metric(Metric::Temperature, 30.0, now).is_none());
        assert!(correlator.apply_metric(Metric::Humidity, 55.0, now).is_none());
        let reading = correlator
            .apply_metric(Metric::AirQuality, 1.5, now)
            .unwrap();

        assert_eq!(reading.temperature, 30.0);
    }

    #[test]
    fn test_latest_snapshot_reemits_on_each_update() {
        let correlator = ReadingCorrelator::new(MergePolicy::LatestSnapshot);
        let now = Utc::now();
        for metric in ALL {
            correlator.apply_metric(metric, value_for(metric), now);
        }

        let again = correlator
            .apply_metric(Metric::Humidity, 60.0, now)
            .expect("snapshot policy emits on every update once complete");
        assert_eq!(again.humidity, 60.0);
        assert_eq!(again.temperature, 21.5);
        assert_eq!(correlator.snapshot().humidity, Some(60.0));
    }

    #[test]
    fn test_reset_after_emit_requires_fresh_triple() {
        let correlator = ReadingCorrelator::new(MergePolicy::ResetAfterEmit);
        let now = Utc::now();
        for metric in ALL {
            correlator.apply_metric(metric, value_for(metric), now);
        }

        let snapshot = correlator.snapshot();
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.last_update, Some(now));

        assert!(correlator.apply_metric(Metric::Humidity, 60.0, now).is_none());
        assert!(correlator.apply_metric(Metric::AirQuality, 0.1, now).is_none());
        let next = correlator
            .apply_metric(Metric::Temperature, 19.0, now)
            .unwrap();
        assert_eq!((next.temperature, next.humidity, next.air_quality), (19.0, 60.0, 0.1));
    }

    #[test]
    fn test_snapshot_tracks_last_update() {
        let correlator = ReadingCorrelator::default();
        assert_eq!(correlator.snapshot(), PendingCorrelation::default());

        let now = Utc::now();
        correlator.apply_metric(Metric::AirQuality, 0.4, now);
        let snapshot = correlator.snapshot();
        assert_eq!(snapshot.air_quality, Some(0.4));
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.last_update, Some(now));
    }

    #[test]
    fn test_concurrent_updates_emit_exactly_once() {
        for _ in 0..200 {
            let correlator = Arc::new(ReadingCorrelator::new(MergePolicy::ResetAfterEmit));
            let emitted = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = ALL
                .into_iter()
                .map(|metric| {
                    let correlator = Arc::clone(&correlator);
                    let emitted = Arc::clone(&emitted);
                    std::thread::spawn(move || {
                        if correlator
                            .apply_metric(metric, value_for(metric), Utc::now())
                            .is_some()
                        {
                            emitted.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(emitted.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_merge_policy_serde_names() {
        let policy: MergePolicy = serde_json::from_str("\"reset-after-emit\"").unwrap();
        assert_eq!(policy, MergePolicy::ResetAfterEmit);
        assert_eq!(
            serde_json::to_string(&MergePolicy::LatestSnapshot).unwrap(),
            "\"latest-snapshot\""
        );
        assert_eq!(MergePolicy::ResetAfterEmit.as_str(), "reset-after-emit");
    }

    #[test]
    fn test_metric_names_match_reading_fields() {
        assert_eq!(Metric::Temperature.as_str(), "temperature");
        assert_eq!(Metric::Humidity.as_str(), "humidity");
        assert_eq!(Metric::AirQuality.as_str(), "air_quality");
    }
}
