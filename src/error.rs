use thiserror::Error;

/// Errors surfaced by the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// New-movie body is not a JSON object carrying every required key
    #[error("Invalid request body")]
    InvalidBody,

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

#[cfg(feature = "server")]
mod response {
    use super::ApiError;
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use serde_json::json;

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            match &self {
                ApiError::InvalidBody => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": self.to_string() })),
                )
                    .into_response(),
                ApiError::Store(_) => {
                    tracing::error!(error = %self, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Internal server error" })),
                    )
                        .into_response()
                }
            }
        }
    }
}
