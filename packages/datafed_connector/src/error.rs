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

    #[error("user already exists")]
    Conflict,

    #[error("user not found")]
    NotFound,

    #[error("invalid credentials")]
    Unauthorized,

    #[error("key directory error: {0}")]
    Directory(String),

    #[error("key directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("federated catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Directory failures during registration propagate: a user whose key
    /// never reached the directory cannot sign anything useful.
    pub fn from_directory(err: ClientError) -> Self {
        match err {
            ClientError::Conflict => Self::Directory("identity already registered".into()),
            ClientError::Unavailable(msg) => Self::DirectoryUnavailable(msg),
            other => Self::Directory(other.to_string()),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Directory(_) => "directory_rejected",
            Self::DirectoryUnavailable(_) => "directory_unavailable",
            Self::CatalogUnavailable(_) => "catalog_unavailable",
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::Conflict | Self::Directory(_) => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::DirectoryUnavailable(_) | Self::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,
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
