use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use datafed_auth::{Keypair, canonical, to_utc_string};
use datafed_client::catalog::SearchResponse;
use datafed_client::directory::{KeyRecord, SignedKeyRequest};
use tracing::info;

use crate::AppState;
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::models::{LoginRequest, MessageResponse, RegisterRequest, User, UserView};

/// How long a freshly signed self-registration stays acceptable.
const REGISTRATION_WINDOW_MINUTES: i64 = 5;

/// Create a user: generate a keypair, self-register the public half with
/// the key directory, then persist the credential locally. A directory
/// failure aborts registration; a user whose key never reached the
/// directory could not sign anything useful.
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_user(&req.user_id).await?.is_some() {
        return Err(ApiError::Conflict);
    }

    let keypair = Keypair::generate();
    let public_key = keypair.public_key_pem()?;
    let expire_time = to_utc_string(Utc::now() + Duration::minutes(REGISTRATION_WINDOW_MINUTES));
    let msg = canonical::message(&[&req.user_id, &public_key, &expire_time]);
    state
        .directory
        .register(&SignedKeyRequest {
            identity: req.user_id.clone(),
            public_key: public_key.clone(),
            signature: keypair.sign_base64(&msg),
            expire_time,
        })
        .await
        .map_err(ApiError::from_directory)?;

    let user = User {
        user_id: req.user_id,
        password_hash: req.password_hash,
        public_key,
        secret_key: keypair.seed_base64(),
        created_at: to_utc_string(Utc::now()),
    };
    if !state.db.insert_user(&user).await? {
        return Err(ApiError::Conflict);
    }

    info!(user = %user.user_id, "registered user and directory key");
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

/// Compare the submitted pre-hashed password against the stored hash.
pub async fn login_user(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.db.get_user(&req.user_id).await?.ok_or(ApiError::NotFound)?;
    if user.password_hash != req.password_hash {
        return Err(ApiError::Unauthorized);
    }
    Ok(Json(MessageResponse {
        message: "Login successful".to_string(),
    }))
}

/// Fetch a stored credential record, minus the secret key. Any
/// authenticated user may look up any user.
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthedUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let user = state.db.get_user(&user_id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(UserView::from(user)))
}

/// Forward the directory's unauthenticated key enumeration.
pub async fn list_directory_keys(
    State(state): State<AppState>,
    _auth: AuthedUser,
) -> Result<Json<Vec<KeyRecord>>, ApiError> {
    let keys = state
        .directory
        .list()
        .await
        .map_err(|e| ApiError::DirectoryUnavailable(e.to_string()))?;
    Ok(Json(keys))
}

/// Forward a keyword search to the federated catalog.
pub async fn search_catalog(
    State(state): State<AppState>,
    _auth: AuthedUser,
    Path(keyword): Path<String>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = state
        .catalog
        .search_by_keyword(&keyword)
        .await
        .map_err(|e| ApiError::CatalogUnavailable(e.to_string()))?;
    Ok(Json(response))
}
