use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// The `Display` string of each variant is exactly what goes on the wire;
/// clients match on these bodies, so treat them as frozen. Provider details
/// are logged here and never leaked to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body had no usable script.
    #[error("Script is required")]
    MissingScript,

    /// The script or settings failed validation; the reason is client-safe.
    #[error("{0}")]
    Validation(String),

    /// The provider call failed (transport error, non-2xx, or unreadable
    /// response). The detail stays in the logs.
    #[error("Server error while generating video")]
    ProviderFailure(String),

    /// The provider answered 2xx but returned no output URL.
    #[error("Video generation failed")]
    ProviderNoOutput,

    /// Anything else. The detail stays in the logs.
    #[error("Internal server error")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingScript | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ProviderFailure(_) | ApiError::ProviderNoOutput | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        match &self {
            ApiError::ProviderFailure(detail) => {
                tracing::error!(error = %detail, "video provider call failed");
            }
            ApiError::ProviderNoOutput => {
                tracing::error!("video provider returned no output url");
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
            }
            _ => {}
        }

        let body = json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
