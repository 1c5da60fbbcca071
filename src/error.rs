use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// GatewayError
///
/// Failures of the gateway's own I/O. The route guard never produces one of these;
/// it degrades instead. Clients only ever see the generic message, the detail is logged.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    InvalidBody(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-safe message.
    pub fn message(&self) -> &'static str {
        match self {
            GatewayError::Upstream(_) => "Upstream unavailable",
            GatewayError::PayloadTooLarge { .. } => "Request body too large",
            GatewayError::InvalidBody(_) => "Invalid request body",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::PayloadTooLarge { .. } | GatewayError::InvalidBody(_) => {
                tracing::warn!(error = %self, "rejecting request")
            }
            _ => tracing::error!(error = %self, "upstream forwarding failed"),
        }

        (self.status_code(), Json(ErrorBody::new(self.message()))).into_response()
    }
}
