//! API server initialization

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use super::middleware;
use super::openapi::openapi_json;
use super::routes::{health, publish, readings};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::SensorMessage;
use crate::data::topics::{Publisher, TopicService};
use crate::domain::{QueryService, ReadingCorrelator};

/// Everything the HTTP surface needs from the application
pub struct ApiContext<'a> {
    pub query: QueryService,
    pub correlator: Arc<ReadingCorrelator>,
    pub topics: Arc<TopicService>,
    pub publisher: Publisher<SensorMessage>,
    pub static_dir: Option<&'a Path>,
}

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Serve until shutdown is triggered; returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;
        let shutdown = app.shutdown.clone();

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = build_router(ApiContext {
            query: QueryService::new(app.store.clone()),
            correlator: app.correlator.clone(),
            topics: app.topics.clone(),
            publisher: app.sensor_topic.publisher(),
            static_dir: app.config.server.static_dir.as_deref(),
        });

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "HTTP server listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Assemble the full router: `/api` endpoints, OpenAPI document and optional dashboard
pub fn build_router(ctx: ApiContext<'_>) -> Router {
    let api_routes = Router::new()
        .merge(health::routes(ctx.topics))
        .merge(readings::routes(ctx.query, ctx.correlator))
        .merge(publish::routes(ctx.publisher))
        .route("/openapi.json", get(openapi_json))
        .fallback(middleware::handle_404);

    let router = Router::new().nest("/api", api_routes);

    let router = match ctx.static_dir {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "Serving dashboard assets");
            router.fallback_service(ServeDir::new(dir).fallback(any(middleware::handle_404)))
        }
        None => router.fallback(middleware::handle_404),
    };

    router
        .layer(CompressionLayer::new())
        .layer(middleware::cors())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}
