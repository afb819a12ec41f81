use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
///
/// The taxonomy maps one-to-one onto the response codes the upstream
/// gateway keys its retry behavior on: authentication failures are never
/// retried, validation failures are the sender's problem, rate limiting
/// means back off, and internal errors are safe to retry because replay-key
/// dedup makes redelivery idempotent.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no parsable records in payload")]
    UnparsableMessage,

    #[error("payload too large: max {0}MB allowed")]
    PayloadTooLarge(usize),

    #[error("routing error: {0}")]
    Routing(#[from] routing::RoutingError),

    #[error("not found")]
    NotFound,

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UnparsableMessage => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Routing(routing::RoutingError::ResultNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ServerError::Routing(routing::RoutingError::DuplicateSourceMessage(_)) => {
                StatusCode::CONFLICT
            }
            ServerError::Routing(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::UnparsableMessage => "UNPARSABLE_MESSAGE",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::Routing(_) => "ROUTING_ERROR",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
