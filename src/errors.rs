use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Every handler error funnels through here, so the client always sees the
/// same `{"success": false, "error": ...}` shape.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Missing minimal required fields")]
    MissingFields(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"success": false, "error": "internal server error"}),
                )
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"success": false, "error": msg}),
            ),
            AppError::MissingFields(missing) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "success": false,
                    "error": "Missing minimal required fields",
                    "missing": missing,
                }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({"success": false, "error": msg}),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"success": false, "error": "unauthorized"}),
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                serde_json::json!({"success": false, "error": msg}),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
