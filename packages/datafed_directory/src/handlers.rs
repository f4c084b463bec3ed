use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use datafed_auth::{canonical, check_not_expired, to_utc_string, verify_signature};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::models::{KeyRecord, MessageResponse, SignedKeyRequest};

/// Register a new identity. Signed message: `identity‖public_key‖expire_time`,
/// verified against the submitted key itself (proof of possession).
pub async fn register_key(
    State(state): State<AppState>,
    Json(req): Json<SignedKeyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_not_expired(&req.expire_time)?;
    let msg = canonical::message(&[&req.identity, &req.public_key, &req.expire_time]);
    verify_signature(&req.public_key, &msg, &req.signature)?;

    let registered_at = to_utc_string(Utc::now());
    let inserted = state
        .db
        .insert_key(&req.identity, &req.public_key, &registered_at)
        .await?;
    if !inserted {
        return Err(ApiError::AlreadyRegistered);
    }

    info!(identity = %req.identity, "registered public key");
    Ok((
        StatusCode::CREATED,
        Json(KeyRecord {
            identity: req.identity,
            public_key: req.public_key,
            registered_at,
        }),
    ))
}

/// Resolve an identity to its current key. This is the trust anchor the
/// catalog and local services call before verifying any signature.
pub async fn resolve_key(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<KeyRecord>, ApiError> {
    let record = state.db.get_key(&identity).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(record))
}

/// Remove an identity's key. Only the holder of the *currently registered*
/// key may remove it: the submitted key must byte-match the stored one.
pub async fn remove_key(
    State(state): State<AppState>,
    Json(req): Json<SignedKeyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    check_not_expired(&req.expire_time)?;

    let stored = state
        .db
        .get_key(&req.identity)
        .await?
        .ok_or(ApiError::NotFound)?;
    if stored.public_key != req.public_key {
        return Err(ApiError::KeyMismatch);
    }

    let msg = canonical::message(&[&req.identity, &req.public_key, &req.expire_time]);
    verify_signature(&stored.public_key, &msg, &req.signature)?;

    state.db.delete_key(&req.identity).await?;
    info!(identity = %req.identity, "removed public key");
    Ok(Json(MessageResponse {
        message: format!("Key for '{}' deleted.", req.identity),
    }))
}

/// Unauthenticated enumeration. Intentionally a low-security debug surface:
/// key material here is public by definition.
pub async fn list_keys(State(state): State<AppState>) -> Result<Json<Vec<KeyRecord>>, ApiError> {
    Ok(Json(state.db.list_keys().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use datafed_auth::Keypair;
    use tower::ServiceExt;

    use crate::db::Database;

    async fn test_app() -> axum::Router {
        let db = Database::connect_in_memory().await.expect("in-memory db");
        crate::router(AppState { db })
    }

    fn expire_in(minutes: i64) -> String {
        to_utc_string(Utc::now() + Duration::minutes(minutes))
    }

    fn register_body(identity: &str, kp: &Keypair, expire_time: &str) -> String {
        let pem = kp.public_key_pem().unwrap();
        let msg = canonical::message(&[identity, &pem, expire_time]);
        let sig = kp.sign_base64(&msg);
        serde_json::json!({
            "identity": identity,
            "public_key": pem,
            "signature": sig,
            "expire_time": expire_time,
        })
        .to_string()
    }

    async fn send(app: &axum::Router, method: &str, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn register_and_resolve() {
        let app = test_app().await;
        let kp = Keypair::generate();
        let exp = expire_in(5);

        let (status, body) = send(&app, "POST", "/keys", register_body("alice", &kp, &exp)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["identity"], "alice");

        let (status, body) = send(&app, "GET", "/keys/alice", String::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["public_key"], kp.public_key_pem().unwrap());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = test_app().await;
        let kp = Keypair::generate();
        let exp = expire_in(5);

        let (status, _) = send(&app, "POST", "/keys", register_body("bob", &kp, &exp)).await;
        assert_eq!(status, StatusCode::CREATED);

        // Same identity, fresh key. No rotation operation exists.
        let kp2 = Keypair::generate();
        let (status, body) = send(&app, "POST", "/keys", register_body("bob", &kp2, &exp)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already_registered");
    }

    #[tokio::test]
    async fn expired_signature_rejected() {
        let app = test_app().await;
        let kp = Keypair::generate();
        let exp = to_utc_string(Utc::now() - Duration::seconds(2));

        let (status, body) = send(&app, "POST", "/keys", register_body("carol", &kp, &exp)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "expired");
    }

    #[tokio::test]
    async fn wrong_signer_rejected() {
        let app = test_app().await;
        let kp = Keypair::generate();
        let other = Keypair::generate();
        let exp = expire_in(5);

        // Body claims kp's public key but is signed by `other`.
        let pem = kp.public_key_pem().unwrap();
        let msg = canonical::message(&["dave", &pem, &exp]);
        let body = serde_json::json!({
            "identity": "dave",
            "public_key": pem,
            "signature": other.sign_base64(&msg),
            "expire_time": exp,
        })
        .to_string();

        let (status, json) = send(&app, "POST", "/keys", body).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "invalid_signature");
    }

    #[tokio::test]
    async fn malformed_key_rejected() {
        let app = test_app().await;
        let kp = Keypair::generate();
        let exp = expire_in(5);
        let body = serde_json::json!({
            "identity": "erin",
            "public_key": "not a pem at all",
            "signature": kp.sign_base64(b"whatever"),
            "expire_time": exp,
        })
        .to_string();

        let (status, json) = send(&app, "POST", "/keys", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "malformed_input");
    }

    #[tokio::test]
    async fn resolve_unknown_is_not_found() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/keys/nobody", String::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn remove_requires_current_key() {
        let app = test_app().await;
        let kp = Keypair::generate();
        let exp = expire_in(5);
        send(&app, "POST", "/keys", register_body("frank", &kp, &exp)).await;

        // Attacker presents their own (validly signed) key for frank.
        let attacker = Keypair::generate();
        let (status, body) = send(&app, "DELETE", "/keys", register_body("frank", &attacker, &exp)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        // The real holder can remove, and the identity becomes free again.
        let (status, _) = send(&app, "DELETE", "/keys", register_body("frank", &kp, &exp)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/keys/frank", String::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/keys", register_body("frank", &kp, &exp)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn remove_unknown_is_not_found() {
        let app = test_app().await;
        let kp = Keypair::generate();
        let (status, _) = send(&app, "DELETE", "/keys", register_body("ghost", &kp, &expire_in(5))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_enumerates_registered_keys() {
        let app = test_app().await;
        let exp = expire_in(5);
        for name in ["u1", "u2", "u3"] {
            let kp = Keypair::generate();
            send(&app, "POST", "/keys", register_body(name, &kp, &exp)).await;
        }

        let (status, body) = send(&app, "GET", "/keys", String::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }
}
