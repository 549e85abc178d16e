//! SensorHub: environmental sensor ingestion pipeline and query API

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
