//! HTTP Basic gate for the forwarding endpoints.
//!
//! The Basic password field carries the pre-hashed password, compared
//! against the hash stored at registration. Authenticated requests carry an
//! [`AuthedUser`] extension for handlers to extract.

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};

use crate::AppState;

/// The user authenticated by the Basic credentials on this request.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message,
        })),
    )
        .into_response()
}

pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(creds) = request.headers().typed_get::<Authorization<Basic>>() else {
        return unauthorized("Basic credentials required");
    };

    let user = match state.db.get_user(creds.username()).await {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized("unknown user"),
        Err(e) => {
            tracing::error!("credential lookup failed: {e:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "internal",
                    "message": "internal error",
                })),
            )
                .into_response();
        }
    };
    if user.password_hash != creds.password() {
        return unauthorized("invalid password hash");
    }

    request.extensions_mut().insert(AuthedUser {
        user_id: user.user_id,
    });
    next.run(request).await
}

/// Extract the authenticated user placed by the middleware. 401 when the
/// route was wired up without the gate.
impl<S> axum::extract::FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthedUser>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "authentication required",
                })),
            )
        })
    }
}
