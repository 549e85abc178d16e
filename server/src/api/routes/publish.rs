//! Message channel publish bridge
//!
//! Accepts a raw text payload for a sensor topic and places it on the
//! in-process message channel, where the ingestion dispatcher picks it up.

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::types::ApiError;
use crate::core::constants::PUBLISH_BODY_LIMIT;
use crate::data::SensorMessage;
use crate::data::topics::Publisher;

#[derive(Clone)]
pub struct PublishState {
    publisher: Publisher<SensorMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublishResponse {
    pub success: bool,
    pub topic: String,
}

pub fn routes(publisher: Publisher<SensorMessage>) -> Router<()> {
    Router::new()
        .route("/publish/{*topic}", post(publish))
        .layer(DefaultBodyLimit::max(PUBLISH_BODY_LIMIT))
        .with_state(PublishState { publisher })
}

/// Publish one sensor message
#[utoipa::path(
    post,
    path = "/api/publish/{topic}",
    tag = "ingestion",
    params(
        ("topic" = String, Path, description = "Topic name, may contain slashes (e.g. iot/sensor/temperature)")
    ),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 202, description = "Message queued", body = PublishResponse),
        (status = 400, description = "Empty topic"),
        (status = 503, description = "Channel saturated or disconnected")
    )
)]
pub async fn publish(
    State(state): State<PublishState>,
    Path(topic): Path<String>,
    payload: String,
) -> Result<(StatusCode, Json<PublishResponse>), ApiError> {
    let topic = topic.trim_matches('/');
    if topic.is_empty() {
        return Err(ApiError::bad_request("Topic must not be empty"));
    }

    state
        .publisher
        .publish(SensorMessage::new(topic, payload))
        .inspect_err(|e| tracing::warn!(topic, error = %e, "Failed to publish sensor message"))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishResponse {
            success: true,
            topic: topic.to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::core::constants::TOPIC_SENSOR_MESSAGES;
    use crate::data::topics::{TopicConfig, TopicService};

    fn post_request(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "text/plain")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_publish_delivers_to_subscriber() {
        let topics = TopicService::new();
        let topic = topics.topic::<SensorMessage>(TOPIC_SENSOR_MESSAGES).unwrap();
        let mut subscriber = topic.stream_subscribe().unwrap();
        let router = routes(topic.publisher());

        let response = router
            .oneshot(post_request("/publish/iot/sensor/temperature", "21.5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let (_, msg) = subscriber.recv().await.unwrap();
        assert_eq!(msg.topic, "iot/sensor/temperature");
        assert_eq!(msg.payload, "21.5");
    }

    #[tokio::test]
    async fn test_publish_backpressure_returns_retry_after() {
        let topics = TopicService::with_config(TopicConfig {
            buffer_size: 1,
            channel_capacity: 4,
        });
        let topic = topics.topic::<SensorMessage>(TOPIC_SENSOR_MESSAGES).unwrap();
        let router = routes(topic.publisher());

        let response = router
            .oneshot(post_request("/publish/iot/sensor/humidity", "50"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key("retry-after"));
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_is_unavailable() {
        let topics = TopicService::new();
        let topic = topics.topic::<SensorMessage>(TOPIC_SENSOR_MESSAGES).unwrap();
        let router = routes(topic.publisher());
        topics.shutdown();

        let response = router
            .oneshot(post_request("/publish/iot/sensor/humidity", "50"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!response.headers().contains_key("retry-after"));
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected() {
        let topics = TopicService::new();
        let topic = topics.topic::<SensorMessage>(TOPIC_SENSOR_MESSAGES).unwrap();
        let router = routes(topic.publisher());

        let body = "1".repeat(PUBLISH_BODY_LIMIT + 1);
        let response = router
            .oneshot(post_request("/publish/iot/sensor/humidity", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
