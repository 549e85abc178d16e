//! SQLite repositories
//!
//! Types (Reading, NewReading, etc.) should be imported from `crate::data::types`.

pub mod reading;

pub use reading::{
    delete_older_than, insert_reading, latest_reading, readings_in_range, recent_readings,
    statistics_since,
};
