use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use datafed_auth::{canonical, check_not_expired, parse_utc, to_utc_string, verify_signature};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::models::{
    AccessGrant, GrantRequest, GrantsResponse, LocalResource, MessageResponse,
    PublishResourceRequest, RevokeGrantRequest, RevokeResourceRequest, SignedReadRequest,
};

async fn resolve_admin_key(state: &AppState, identity: &str) -> Result<String, ApiError> {
    state
        .directory
        .resolve(identity)
        .await
        .map_err(|e| ApiError::from_directory(identity, e))
}

/// Register a resource under this site. Signed message:
/// `data_id‖description‖admin_id‖endpoint‖expire_time`.
pub async fn publish_resource(
    State(state): State<AppState>,
    Json(req): Json<PublishResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_not_expired(&req.expire_time)?;
    let admin_key = resolve_admin_key(&state, &req.admin_id).await?;
    let msg = canonical::message(&[
        &req.data_id,
        &req.description,
        &req.admin_id,
        &req.endpoint,
        &req.expire_time,
    ]);
    verify_signature(&admin_key, &msg, &req.signature)?;

    let resource = LocalResource {
        data_id: req.data_id,
        admin_id: req.admin_id,
        description: req.description,
        endpoint: req.endpoint,
        created_at: to_utc_string(Utc::now()),
    };
    if !state.db.insert_resource(&resource).await? {
        return Err(ApiError::DuplicateId);
    }

    info!(data_id = %resource.data_id, admin = %resource.admin_id, "registered resource");
    Ok((StatusCode::CREATED, Json(resource)))
}

/// Read a resource's metadata. Only the stored administrator may read; the
/// request signs the `expire_time` alone.
pub async fn read_resource(
    State(state): State<AppState>,
    Path(data_id): Path<String>,
    Json(req): Json<SignedReadRequest>,
) -> Result<Json<LocalResource>, ApiError> {
    let resource = state.db.get_resource(&data_id).await?.ok_or(ApiError::NotFound)?;
    if resource.admin_id != req.admin_id {
        return Err(ApiError::Forbidden(format!(
            "'{}' does not administer '{data_id}'",
            req.admin_id
        )));
    }
    check_not_expired(&req.expire_time)?;
    let admin_key = resolve_admin_key(&state, &req.admin_id).await?;
    let msg = canonical::message(&[&req.expire_time]);
    verify_signature(&admin_key, &msg, &req.signature)?;

    Ok(Json(resource))
}

/// Delete a resource and every grant under it. The request's fields must
/// byte-match the stored record before any cryptographic check runs, so a
/// mismatch is reported as such rather than as a signature failure.
pub async fn revoke_resource(
    State(state): State<AppState>,
    Path(data_id): Path<String>,
    Json(req): Json<RevokeResourceRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let resource = state.db.get_resource(&data_id).await?.ok_or(ApiError::NotFound)?;
    if resource.admin_id != req.admin_id
        || resource.description != req.description
        || resource.endpoint != req.endpoint
    {
        return Err(ApiError::RecordMismatch);
    }
    check_not_expired(&req.expire_time)?;
    let admin_key = resolve_admin_key(&state, &req.admin_id).await?;
    let msg = canonical::message(&[
        &data_id,
        &req.description,
        &req.admin_id,
        &req.endpoint,
        &req.expire_time,
    ]);
    verify_signature(&admin_key, &msg, &req.signature)?;

    state.db.delete_resource(&data_id).await?;
    info!(data_id = %data_id, admin = %req.admin_id, "revoked resource and its grants");
    Ok(Json(MessageResponse {
        message: format!("{data_id} and all associated grants deleted."),
    }))
}

/// Issue a time-bound grant. Signed by the resource's administrator:
/// `data_id‖grantee_id‖expires_at‖expire_time`. At most one grant per
/// (resource, grantee) pair; a lapsed grant still occupies the slot until it
/// is explicitly revoked.
pub async fn grant_access(
    State(state): State<AppState>,
    Json(req): Json<GrantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_not_expired(&req.expire_time)?;
    let resource = state
        .db
        .get_resource(&req.data_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let admin_key = resolve_admin_key(&state, &resource.admin_id).await?;
    let msg = canonical::message(&[
        &req.data_id,
        &req.grantee_id,
        &req.expires_at,
        &req.expire_time,
    ]);
    verify_signature(&admin_key, &msg, &req.signature)?;

    // Normalize to the fixed RFC 3339 layout so stored values compare
    // lexicographically.
    let expires_at = parse_utc(&req.expires_at)
        .map(to_utc_string)
        .map_err(|_| ApiError::InvalidExpiry(req.expires_at.clone()))?;

    let grant = AccessGrant {
        data_id: req.data_id,
        grantee_id: req.grantee_id,
        expires_at,
        created_at: to_utc_string(Utc::now()),
    };
    if !state.db.insert_grant(&grant).await? {
        return Err(ApiError::DuplicateGrant);
    }

    info!(
        data_id = %grant.data_id,
        grantee = %grant.grantee_id,
        expires_at = %grant.expires_at,
        "issued access grant",
    );
    Ok((StatusCode::CREATED, Json(grant)))
}

/// List a resource's grants that are still in force. Administrator-gated
/// like `read_resource`; lapsed grants are filtered out of the response but
/// remain on record.
pub async fn read_grants(
    State(state): State<AppState>,
    Path(data_id): Path<String>,
    Json(req): Json<SignedReadRequest>,
) -> Result<Json<GrantsResponse>, ApiError> {
    let resource = state.db.get_resource(&data_id).await?.ok_or(ApiError::NotFound)?;
    if resource.admin_id != req.admin_id {
        return Err(ApiError::Forbidden(format!(
            "'{}' does not administer '{data_id}'",
            req.admin_id
        )));
    }
    check_not_expired(&req.expire_time)?;
    let admin_key = resolve_admin_key(&state, &req.admin_id).await?;
    let msg = canonical::message(&[&req.expire_time]);
    verify_signature(&admin_key, &msg, &req.signature)?;

    let grants = state.db.valid_grants(&data_id, &to_utc_string(Utc::now())).await?;
    Ok(Json(GrantsResponse {
        data_id,
        count: grants.len(),
        grants,
    }))
}

/// Revoke one grant. Signed by the resource's administrator:
/// `data_id‖grantee_id‖expire_time`.
pub async fn revoke_grant(
    State(state): State<AppState>,
    Path((data_id, grantee_id)): Path<(String, String)>,
    Json(req): Json<RevokeGrantRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .db
        .get_grant(&data_id, &grantee_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    check_not_expired(&req.expire_time)?;
    let resource = state.db.get_resource(&data_id).await?.ok_or(ApiError::NotFound)?;
    let admin_key = resolve_admin_key(&state, &resource.admin_id).await?;
    let msg = canonical::message(&[&data_id, &grantee_id, &req.expire_time]);
    verify_signature(&admin_key, &msg, &req.signature)?;

    state.db.delete_grant(&data_id, &grantee_id).await?;
    info!(data_id = %data_id, grantee = %grantee_id, "revoked access grant");
    Ok(Json(MessageResponse {
        message: format!("Grant for {grantee_id} on {data_id} deleted."),
    }))
}
