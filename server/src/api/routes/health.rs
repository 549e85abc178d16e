//! Health check endpoint

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::topics::TopicService;

#[derive(Clone)]
pub struct HealthState {
    topics: Arc<TopicService>,
    started: Instant,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    /// Message channel state: "connected" or "disconnected"
    pub channel: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
}

pub fn routes(topics: Arc<TopicService>) -> Router<()> {
    let state = HealthState {
        topics,
        started: Instant::now(),
    };
    Router::new().route("/health", get(health)).with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    let channel = if state.topics.is_connected() {
        "connected"
    } else {
        "disconnected"
    };
    Json(HealthResponse {
        success: true,
        status: "running",
        channel,
        uptime: state.started.elapsed().as_secs(),
    })
}
