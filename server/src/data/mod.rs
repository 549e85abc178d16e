//! Data storage layer
//!
//! - `sqlite` - Durable reading store (schema, repositories, WAL maintenance)
//! - `topics` - In-process message channel feeding the ingestion pipeline
//! - `types` - Shared data types
//! - `traits` - Repository trait implemented by the store
//! - `error` - Classified store errors

pub mod error;
pub mod sqlite;
pub mod topics;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use sqlite::SqliteService;
pub use traits::ReadingRepository;
pub use types::{NewReading, Reading, SensorMessage, StatisticsWindow};
