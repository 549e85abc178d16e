//! API route handlers

pub mod health;
pub mod publish;
pub mod readings;
