//! Reading query endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::types::ApiError;
use crate::data::{Reading, StatisticsWindow};
use crate::domain::readings::PendingCorrelation;
use crate::domain::{CleanupReport, QueryService, ReadingCorrelator, StatisticsReport};

#[derive(Clone)]
pub struct ReadingsApiState {
    pub query: QueryService,
    pub correlator: Arc<ReadingCorrelator>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestResponse {
    pub success: bool,
    /// Most recent persisted reading; null when nothing is stored yet
    pub data: Option<Reading>,
    /// Current in-memory correlation state
    pub realtime: PendingCorrelation,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingsResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Reading>,
}

impl ReadingsResponse {
    fn new(data: Vec<Reading>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatisticsResponse {
    pub success: bool,
    /// Window length, e.g. "24 hours"
    pub period: String,
    pub statistics: StatisticsWindow,
}

impl From<StatisticsReport> for StatisticsResponse {
    fn from(report: StatisticsReport) -> Self {
        Self {
            success: true,
            period: format!("{} hours", report.hours),
            statistics: report.statistics,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted: u64,
    pub message: String,
}

impl From<CleanupReport> for CleanupResponse {
    fn from(report: CleanupReport) -> Self {
        Self {
            success: true,
            deleted: report.deleted,
            message: format!(
                "Deleted {} records older than {} days",
                report.deleted, report.days
            ),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeQuery {
    /// Inclusive lower bound (RFC 3339 or `YYYY-MM-DD HH:MM:SS`, UTC)
    pub start: Option<String>,
    /// Inclusive upper bound (RFC 3339 or `YYYY-MM-DD HH:MM:SS`, UTC)
    pub end: Option<String>,
}

/// Build reading query routes
pub fn routes(query: QueryService, correlator: Arc<ReadingCorrelator>) -> Router<()> {
    let state = ReadingsApiState { query, correlator };

    Router::new()
        .route("/latest", get(latest))
        .route("/recent", get(recent_default))
        .route("/recent/{limit}", get(recent))
        .route("/statistics", get(statistics_default))
        .route("/statistics/{hours}", get(statistics))
        .route("/range", get(range))
        .route("/cleanup", delete(cleanup_default))
        .route("/cleanup/{days}", delete(cleanup))
        .with_state(state)
}

/// Latest persisted reading and the in-progress correlation
#[utoipa::path(
    get,
    path = "/api/latest",
    tag = "readings",
    responses(
        (status = 200, description = "Latest reading", body = LatestResponse),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn latest(
    State(state): State<ReadingsApiState>,
) -> Result<Json<LatestResponse>, ApiError> {
    let data = state.query.latest().await?;
    Ok(Json(LatestResponse {
        success: true,
        data,
        realtime: state.correlator.snapshot(),
    }))
}

/// Newest readings (default limit)
#[utoipa::path(
    get,
    path = "/api/recent",
    tag = "readings",
    responses(
        (status = 200, description = "Newest 100 readings", body = ReadingsResponse)
    )
)]
pub async fn recent_default(
    State(state): State<ReadingsApiState>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let data = state.query.recent(None).await?;
    Ok(Json(ReadingsResponse::new(data)))
}

/// Newest readings, up to `limit`
#[utoipa::path(
    get,
    path = "/api/recent/{limit}",
    tag = "readings",
    params(
        ("limit" = String, Path, description = "Maximum rows; non-positive or non-numeric uses 100")
    ),
    responses(
        (status = 200, description = "Newest readings", body = ReadingsResponse)
    )
)]
pub async fn recent(
    State(state): State<ReadingsApiState>,
    Path(limit): Path<String>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let data = state.query.recent(Some(&limit)).await?;
    Ok(Json(ReadingsResponse::new(data)))
}

/// Aggregates over the last 24 hours
#[utoipa::path(
    get,
    path = "/api/statistics",
    tag = "readings",
    responses(
        (status = 200, description = "Window statistics", body = StatisticsResponse)
    )
)]
pub async fn statistics_default(
    State(state): State<ReadingsApiState>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let report = state.query.statistics(None).await?;
    Ok(Json(report.into()))
}

/// Aggregates over the last `hours`
#[utoipa::path(
    get,
    path = "/api/statistics/{hours}",
    tag = "readings",
    params(
        ("hours" = String, Path, description = "Window length; non-positive or non-numeric uses 24")
    ),
    responses(
        (status = 200, description = "Window statistics", body = StatisticsResponse)
    )
)]
pub async fn statistics(
    State(state): State<ReadingsApiState>,
    Path(hours): Path<String>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let report = state.query.statistics(Some(&hours)).await?;
    Ok(Json(report.into()))
}

/// Readings between two timestamps, inclusive, newest first
#[utoipa::path(
    get,
    path = "/api/range",
    tag = "readings",
    params(RangeQuery),
    responses(
        (status = 200, description = "Readings in range", body = ReadingsResponse),
        (status = 400, description = "Missing or invalid bound")
    )
)]
pub async fn range(
    State(state): State<ReadingsApiState>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let data = state
        .query
        .range(params.start.as_deref(), params.end.as_deref())
        .await?;
    Ok(Json(ReadingsResponse::new(data)))
}

/// Delete readings older than 30 days
#[utoipa::path(
    delete,
    path = "/api/cleanup",
    tag = "readings",
    responses(
        (status = 200, description = "Rows deleted", body = CleanupResponse)
    )
)]
pub async fn cleanup_default(
    State(state): State<ReadingsApiState>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let report = state.query.cleanup(None).await?;
    Ok(Json(report.into()))
}

/// Delete readings older than `days`
#[utoipa::path(
    delete,
    path = "/api/cleanup/{days}",
    tag = "readings",
    params(
        ("days" = String, Path, description = "Retention age; non-positive or non-numeric uses 30")
    ),
    responses(
        (status = 200, description = "Rows deleted", body = CleanupResponse)
    )
)]
pub async fn cleanup(
    State(state): State<ReadingsApiState>,
    Path(days): Path<String>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let report = state.query.cleanup(Some(&days)).await?;
    Ok(Json(report.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use chrono::{Duration, TimeZone, Utc};
    use tower::ServiceExt;

    use crate::data::{NewReading, ReadingRepository, SqliteService};
    use crate::domain::MergePolicy;
    use crate::domain::readings::Metric;

    struct Fixture {
        router: Router,
        store: Arc<SqliteService>,
        correlator: Arc<ReadingCorrelator>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(SqliteService::open_in_memory().await.unwrap());
        let correlator = Arc::new(ReadingCorrelator::new(MergePolicy::LatestSnapshot));
        let router = routes(QueryService::new(store.clone()), correlator.clone());
        Fixture {
            router,
            store,
            correlator,
        }
    }

    async fn call(router: &Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn seed_scenario(store: &SqliteService) {
        let now = Utc::now();
        for (i, (t, h, a)) in [(20.0, 50.0, 0.5), (21.0, 51.0, 0.6), (22.0, 52.0, 2.0)]
            .into_iter()
            .enumerate()
        {
            let at = now - Duration::minutes(30 - 10 * i as i64);
            store.insert(&NewReading::new(t, h, a).at(at)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_latest_on_empty_store() {
        let f = fixture().await;
        let (status, json) = call(&f.router, Method::GET, "/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(json["data"].is_null());
        assert!(json["realtime"]["temperature"].is_null());
    }

    #[tokio::test]
    async fn test_latest_includes_realtime_snapshot() {
        let f = fixture().await;
        seed_scenario(&f.store).await;
        f.correlator.apply_metric(Metric::Humidity, 48.0, Utc::now());

        let (_, json) = call(&f.router, Method::GET, "/latest").await;
        assert_eq!(json["data"]["temperature"], 22.0);
        assert_eq!(json["data"]["air_quality"], 2.0);
        assert_eq!(json["realtime"]["humidity"], 48.0);
        assert!(json["realtime"]["temperature"].is_null());
    }

    #[tokio::test]
    async fn test_recent_limit_and_fallback() {
        let f = fixture().await;
        seed_scenario(&f.store).await;

        let (_, json) = call(&f.router, Method::GET, "/recent/2").await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["data"][0]["temperature"], 22.0);
        assert_eq!(json["data"][1]["temperature"], 21.0);

        for uri in ["/recent", "/recent/0", "/recent/-3", "/recent/abc", "/recent/0.5"] {
            let (status, json) = call(&f.router, Method::GET, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(json["count"], 3, "{uri}");
        }

        let (_, json) = call(&f.router, Method::GET, "/recent/2abc").await;
        assert_eq!(json["count"], 2);
    }

    #[tokio::test]
    async fn test_statistics_scenario() {
        let f = fixture().await;
        seed_scenario(&f.store).await;

        let (status, json) = call(&f.router, Method::GET, "/statistics/24").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"], "24 hours");
        assert_eq!(json["statistics"]["avg_temp"], 21.0);
        assert_eq!(json["statistics"]["min_temp"], 20.0);
        assert_eq!(json["statistics"]["max_temp"], 22.0);
        assert_eq!(json["statistics"]["total_records"], 3);

        let (_, json) = call(&f.router, Method::GET, "/statistics").await;
        assert_eq!(json["period"], "24 hours");
    }

    #[tokio::test]
    async fn test_statistics_empty_window() {
        let f = fixture().await;
        let (_, json) = call(&f.router, Method::GET, "/statistics/6").await;
        assert_eq!(json["period"], "6 hours");
        assert!(json["statistics"]["avg_temp"].is_null());
        assert_eq!(json["statistics"]["total_records"], 0);
    }

    #[tokio::test]
    async fn test_range_requires_bounds() {
        let f = fixture().await;
        let (status, json) = call(&f.router, Method::GET, "/range?start=2026-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Please provide start and end parameters");

        let (status, _) = call(
            &f.router,
            Method::GET,
            "/range?start=soon&end=2026-01-01T00:00:00Z",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_range_returns_window() {
        let f = fixture().await;
        let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        for hour in 0..3 {
            f.store
                .insert(&NewReading::new(hour as f64, 0.0, 0.0).at(base + Duration::hours(hour)))
                .await
                .unwrap();
        }

        let (status, json) = call(
            &f.router,
            Method::GET,
            "/range?start=2026-02-01T01:00:00Z&end=2026-02-01T02:00:00Z",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 2);
        assert_eq!(json["data"][0]["temperature"], 2.0);
    }

    #[tokio::test]
    async fn test_cleanup_reports_deleted_rows() {
        let f = fixture().await;
        let now = Utc::now();
        f.store
            .insert(&NewReading::new(1.0, 1.0, 1.0).at(now - Duration::days(10)))
            .await
            .unwrap();
        f.store
            .insert(&NewReading::new(2.0, 2.0, 2.0).at(now - Duration::days(1)))
            .await
            .unwrap();

        let (status, json) = call(&f.router, Method::DELETE, "/cleanup/7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], 1);
        assert_eq!(json["message"], "Deleted 1 records older than 7 days");

        let (_, json) = call(&f.router, Method::DELETE, "/cleanup").await;
        assert_eq!(json["deleted"], 0);
        assert_eq!(json["message"], "Deleted 0 records older than 30 days");
    }

    #[tokio::test]
    async fn test_store_outage_maps_to_service_unavailable() {
        let f = fixture().await;
        f.store.close().await;
        let (status, json) = call(&f.router, Method::GET, "/recent").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["success"], false);
    }
}
