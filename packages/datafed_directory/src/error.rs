use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use datafed_auth::AuthError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("identity already registered")]
    AlreadyRegistered,

    #[error("key not found")]
    NotFound,

    #[error("public key does not match the registered key")]
    KeyMismatch,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::AlreadyRegistered => "already_registered",
            Self::NotFound => "not_found",
            Self::KeyMismatch => "forbidden",
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(AuthError::InvalidSignature) => StatusCode::FORBIDDEN,
            Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyRegistered => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::KeyMismatch => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Storage faults are logged in full but never leak details.
        let message = match &self {
            Self::Internal(e) => {
                error!("internal error: {e:#}");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (
            self.status(),
            Json(serde_json::json!({
                "error": self.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
