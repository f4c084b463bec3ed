use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use datafed_auth::AuthError;
use datafed_client::ClientError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("data id already exists")]
    DuplicateId,

    #[error("data id not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("key directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Classify a failure from the key directory. A 404 means the claimed
    /// identity has no registered key, so the caller cannot be authorized;
    /// transport failures stay retryable server errors.
    pub fn from_directory(identity: &str, err: ClientError) -> Self {
        match err {
            ClientError::NotFound => {
                Self::Forbidden(format!("no public key registered for '{identity}'"))
            }
            other => Self::DirectoryUnavailable(other.to_string()),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::DuplicateId => "duplicate_id",
            Self::NotFound => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::DirectoryUnavailable(_) => "directory_unavailable",
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(AuthError::InvalidSignature) => StatusCode::FORBIDDEN,
            Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateId => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DirectoryUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
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
