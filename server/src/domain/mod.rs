//! Domain logic for sensor ingestion and queries
//!
//! - `readings` - topic routing, correlation and the ingestion dispatcher
//! - `query` - read-side operations behind the HTTP API
//! - `retention` - periodic pruning of old readings

pub mod query;
pub mod readings;
pub mod retention;

pub use query::{CleanupReport, QueryError, QueryService, StatisticsReport};
pub use readings::{IngestionDispatcher, MergePolicy, ReadingCorrelator, TopicMap};
