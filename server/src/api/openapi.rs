//! OpenAPI document

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{health, publish, readings};
use crate::api::types::ErrorResponse;
use crate::data::{Reading, StatisticsWindow};
use crate::domain::readings::PendingCorrelation;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SensorHub API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Environmental sensor ingestion and query service"
    ),
    tags(
        (name = "health", description = "Liveness and channel status"),
        (name = "readings", description = "Persisted reading queries and retention"),
        (name = "ingestion", description = "Message channel publish bridge")
    ),
    paths(
        health::health,
        readings::latest,
        readings::recent_default,
        readings::recent,
        readings::statistics_default,
        readings::statistics,
        readings::range,
        readings::cleanup_default,
        readings::cleanup,
        publish::publish,
    ),
    components(schemas(
        ErrorResponse,
        Reading,
        StatisticsWindow,
        PendingCorrelation,
        health::HealthResponse,
        readings::LatestResponse,
        readings::ReadingsResponse,
        readings::StatisticsResponse,
        readings::CleanupResponse,
        publish::PublishResponse,
    ))
)]
pub struct ApiDoc;

/// Serve the OpenAPI JSON document
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}
