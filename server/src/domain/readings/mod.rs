//! Sensor reading ingestion
//!
//! - `routing` - maps channel topics to metrics and parses payloads
//! - `correlator` - merges per-metric updates into complete readings
//! - `dispatcher` - consumes the channel and stores completed readings

mod correlator;
mod dispatcher;
mod routing;

pub use correlator::{CompleteReading, MergePolicy, Metric, PendingCorrelation, ReadingCorrelator};
pub use dispatcher::{IngestError, Ingested, IngestionDispatcher};
pub use routing::{TopicKind, TopicMap, parse_payload};
