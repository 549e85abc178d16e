//! Shared API types
//!
//! Every endpoint answers with a `{success, ...}` envelope. Failures carry
//! `{success: false, error}` with a status derived from the error category.

use axum::Json;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::constants::BACKPRESSURE_RETRY_AFTER_SECS;
use crate::data::DataError;
use crate::data::topics::TopicError;
use crate::domain::QueryError;

/// Failure envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    ServiceUnavailable { message: String, retry_after: Option<u64> },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn from_data(e: DataError) -> Self {
        match e {
            DataError::Connection(_) => {
                tracing::warn!(error = %e, "Store unavailable");
                Self::service_unavailable("Database unavailable")
            }
            DataError::ConstraintViolation(_) => {
                tracing::warn!(error = %e, "Constraint violation");
                Self::Conflict {
                    message: e.to_string(),
                }
            }
            _ => {
                tracing::error!(error = %e, "Data error");
                Self::internal("Database operation failed")
            }
        }
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        Self::from_data(e)
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::MissingRangeBound | QueryError::InvalidRangeBound { .. } => {
                Self::bad_request(e.to_string())
            }
            QueryError::Store(e) => Self::from_data(e),
        }
    }
}

impl From<TopicError> for ApiError {
    fn from(e: TopicError) -> Self {
        match e {
            TopicError::BufferFull => Self::ServiceUnavailable {
                message: "Message channel is saturated".to_string(),
                retry_after: Some(BACKPRESSURE_RETRY_AFTER_SECS),
            },
            TopicError::ChannelClosed => Self::service_unavailable("Message channel disconnected"),
            _ => {
                tracing::error!(error = %e, "Message channel error");
                Self::internal("Message channel error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            Self::BadRequest { message } => (StatusCode::BAD_REQUEST, message, None),
            Self::NotFound { message } => (StatusCode::NOT_FOUND, message, None),
            Self::Conflict { message } => (StatusCode::CONFLICT, message, None),
            Self::ServiceUnavailable {
                message,
                retry_after,
            } => (StatusCode::SERVICE_UNAVAILABLE, message, retry_after),
            Self::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message, None),
        };
        let body = Json(ErrorResponse {
            success: false,
            error: message,
        });
        match retry_after {
            Some(secs) => (
                status,
                [(HeaderName::from_static("retry-after"), secs.to_string())],
                body,
            )
                .into_response(),
            None => (status, body).into_response(),
        }
    }
}
