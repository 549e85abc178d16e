//! Ingestion dispatcher
//!
//! Single consumer of the sensor message topic. Each message is handled to
//! completion, including the store insert, before the next one is read.
//! Parse and store failures are logged and the loop keeps going; a failed
//! insert is not retried.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::correlator::ReadingCorrelator;
use super::routing::{TopicKind, TopicMap, parse_payload};
use crate::data::topics::StreamSubscriber;
use crate::data::{DataError, NewReading, ReadingRepository, SensorMessage};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unparseable payload {payload:?} on topic {topic}")]
    ParsePayload { topic: String, payload: String },

    #[error("failed to store reading: {0}")]
    Store(#[from] DataError),
}

/// Result of handling one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Completed a reading that was stored under this id
    Stored(i64),
    /// Metric recorded; reading not complete yet
    Pending,
    /// Device status, observed only
    Status,
    /// Topic not mapped to anything
    Ignored,
}

pub struct IngestionDispatcher {
    topics: TopicMap,
    correlator: Arc<ReadingCorrelator>,
    store: Arc<dyn ReadingRepository>,
}

impl IngestionDispatcher {
    pub fn new(
        topics: TopicMap,
        correlator: Arc<ReadingCorrelator>,
        store: Arc<dyn ReadingRepository>,
    ) -> Self {
        Self {
            topics,
            correlator,
            store,
        }
    }

    /// Route one message through the correlator and store
    pub async fn handle(&self, msg: &SensorMessage) -> Result<Ingested, IngestError> {
        tracing::debug!(topic = %msg.topic, payload = %msg.payload, "Received message");

        let metric = match self.topics.resolve(&msg.topic) {
            TopicKind::Metric(metric) => metric,
            TopicKind::Status => {
                tracing::info!(status = %msg.payload, "Device status");
                return Ok(Ingested::Status);
            }
            TopicKind::Unrecognized => {
                tracing::debug!(topic = %msg.topic, "Ignoring message on unknown topic");
                return Ok(Ingested::Ignored);
            }
        };

        let value = parse_payload(&msg.payload).ok_or_else(|| IngestError::ParsePayload {
            topic: msg.topic.clone(),
            payload: msg.payload.clone(),
        })?;

        // Lock is released before the insert awaits
        let Some(reading) = self
            .correlator
            .apply_metric(metric, value, msg.received_at)
        else {
            tracing::debug!(metric = metric.as_str(), value, "Metric recorded, reading incomplete");
            return Ok(Ingested::Pending);
        };

        let id = self.store.insert(&NewReading::from(reading)).await?;
        tracing::debug!(
            id,
            temperature = reading.temperature,
            humidity = reading.humidity,
            air_quality = reading.air_quality,
            "Saved reading"
        );
        Ok(Ingested::Stored(id))
    }

    async fn process(&self, msg: &SensorMessage) {
        match self.handle(msg).await {
            Ok(_) => {}
            Err(IngestError::ParsePayload { topic, payload }) => {
                tracing::warn!(%topic, %payload, "Dropping unparseable sensor payload");
            }
            Err(IngestError::Store(e)) => {
                tracing::error!(error = %e, transient = e.is_transient(), "Failed to store reading");
            }
        }
    }

    /// Consume messages until shutdown, then drain what is still queued.
    ///
    /// Each message is acked once handled, which returns its share of the
    /// topic budget to publishers.
    pub fn start(
        self,
        mut subscriber: StreamSubscriber<SensorMessage>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let acker = subscriber.acker();
            let mut shutdown_requested = false;

            loop {
                if shutdown_requested {
                    match tokio::time::timeout(Duration::from_millis(100), subscriber.recv()).await
                    {
                        Ok(Ok((msg_id, msg))) => {
                            self.process(&msg).await;
                            if let Err(e) = acker.ack(msg_id) {
                                tracing::warn!(error = %e, msg_id, "Failed to ack during drain");
                            }
                            continue;
                        }
                        _ => break,
                    }
                }

                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("IngestionDispatcher received shutdown, draining...");
                            shutdown_requested = true;
                        }
                    }
                    result = subscriber.recv() => {
                        match result {
                            Ok((msg_id, msg)) => {
                                self.process(&msg).await;
                                if let Err(e) = acker.ack(msg_id) {
                                    tracing::warn!(error = %e, msg_id, "Failed to ack message");
                                }
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "Sensor topic closed");
                                break;
                            }
                        }
                    }
                }
            }
            tracing::debug!("IngestionDispatcher shutdown complete");
        })
    }
}
