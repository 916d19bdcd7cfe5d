use axum::{Json, response::IntoResponse};
use http::StatusCode;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

/// Handler level failures. Malformed input is rejected earlier by the
/// extractors, so beside the missing identity everything comes up from the
/// store.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error(transparent)]
    Dal(#[from] turgus_dal::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use turgus_dal::Error as DalError;
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            ApiError::Dal(DalError::RecordNotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{what} not found"))
            }
            ApiError::Dal(DalError::NotOwner(what)) => (
                StatusCode::FORBIDDEN,
                format!("Forbidden to change other user's {what}"),
            ),
            ApiError::Dal(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
