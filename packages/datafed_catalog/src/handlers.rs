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
use crate::models::{CatalogEntry, MessageResponse, PublishRequest, RetractRequest, SearchResponse};

async fn resolve_owner_key(state: &AppState, identity: &str) -> Result<String, ApiError> {
    state
        .directory
        .resolve(identity)
        .await
        .map_err(|e| ApiError::from_directory(identity, e))
}

/// Publish a descriptor. Signed message:
/// `data_id‖owner_id‖description‖endpoint‖expire_time`, verified against the
/// owner's key as currently registered in the directory.
pub async fn publish_entry(
    State(state): State<AppState>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_not_expired(&req.expire_time)?;
    let owner_key = resolve_owner_key(&state, &req.owner_id).await?;
    let msg = canonical::message(&[
        &req.data_id,
        &req.owner_id,
        &req.description,
        &req.endpoint,
        &req.expire_time,
    ]);
    verify_signature(&owner_key, &msg, &req.signature)?;

    let entry = CatalogEntry {
        data_id: req.data_id,
        owner_id: req.owner_id,
        description: req.description,
        endpoint: req.endpoint,
        created_at: to_utc_string(Utc::now()),
    };
    if !state.db.insert_entry(&entry).await? {
        return Err(ApiError::DuplicateId);
    }

    info!(data_id = %entry.data_id, owner = %entry.owner_id, "published catalog entry");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Retract a descriptor. Signed message: `data_id‖owner_id‖expire_time`.
/// Only the stored owner may retract.
pub async fn retract_entry(
    State(state): State<AppState>,
    Path(data_id): Path<String>,
    Json(req): Json<RetractRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    check_not_expired(&req.expire_time)?;
    let owner_key = resolve_owner_key(&state, &req.owner_id).await?;
    let msg = canonical::message(&[&data_id, &req.owner_id, &req.expire_time]);
    verify_signature(&owner_key, &msg, &req.signature)?;

    let entry = state.db.get_entry(&data_id).await?.ok_or(ApiError::NotFound)?;
    if entry.owner_id != req.owner_id {
        return Err(ApiError::Forbidden(format!(
            "'{}' does not own '{data_id}'",
            req.owner_id
        )));
    }

    state.db.delete_entry(&data_id).await?;
    info!(data_id = %data_id, owner = %req.owner_id, "retracted catalog entry");
    Ok(Json(MessageResponse {
        message: format!("{data_id} deleted."),
    }))
}

/// Unauthenticated point lookup.
pub async fn lookup_entry(
    State(state): State<AppState>,
    Path(data_id): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError> {
    let entry = state.db.get_entry(&data_id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(entry))
}

/// Unauthenticated case-insensitive substring search over descriptions.
pub async fn search_by_keyword(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state.db.search_by_keyword(&keyword).await?;
    Ok(Json(SearchResponse {
        query_type: "search_by_keyword",
        query_value: keyword,
        count: results.len(),
        results,
    }))
}

/// Unauthenticated listing of one owner's entries.
pub async fn search_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state.db.search_by_owner(&owner_id).await?;
    Ok(Json(SearchResponse {
        query_type: "search_by_owner",
        query_value: owner_id,
        count: results.len(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use datafed_auth::Keypair;
    use datafed_client::DirectoryClient;
    use datafed_client::directory::SignedKeyRequest;
    use tower::ServiceExt;

    use crate::db::Database;

    /// Serve a real key directory on an ephemeral port.
    async fn spawn_directory() -> String {
        let db = datafed_directory::db::Database::connect_in_memory()
            .await
            .expect("directory db");
        let app = datafed_directory::router(datafed_directory::AppState { db });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn test_app(directory_url: &str) -> axum::Router {
        let db = Database::connect_in_memory().await.expect("catalog db");
        crate::router(AppState {
            db,
            directory: DirectoryClient::new(directory_url),
        })
    }

    fn expire_in(minutes: i64) -> String {
        to_utc_string(Utc::now() + Duration::minutes(minutes))
    }

    async fn register_identity(directory_url: &str, identity: &str) -> Keypair {
        let kp = Keypair::generate();
        let pem = kp.public_key_pem().unwrap();
        let exp = expire_in(5);
        let msg = canonical::message(&[identity, &pem, &exp]);
        let req = SignedKeyRequest {
            identity: identity.to_string(),
            public_key: pem,
            signature: kp.sign_base64(&msg),
            expire_time: exp,
        };
        DirectoryClient::new(directory_url)
            .register(&req)
            .await
            .expect("register identity");
        kp
    }

    fn publish_body(data_id: &str, owner: &str, kp: &Keypair, expire_time: &str) -> String {
        let description = "ocean temperature series";
        let endpoint = "https://data.example/ocean";
        let msg = canonical::message(&[data_id, owner, description, endpoint, expire_time]);
        serde_json::json!({
            "data_id": data_id,
            "owner_id": owner,
            "description": description,
            "endpoint": endpoint,
            "signature": kp.sign_base64(&msg),
            "expire_time": expire_time,
        })
        .to_string()
    }

    fn retract_body(data_id: &str, owner: &str, kp: &Keypair, expire_time: &str) -> String {
        let msg = canonical::message(&[data_id, owner, expire_time]);
        serde_json::json!({
            "owner_id": owner,
            "signature": kp.sign_base64(&msg),
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
    async fn publish_and_lookup() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let kp = register_identity(&dir, "alice").await;

        let (status, body) =
            send(&app, "POST", "/entries", publish_body("data-1", "alice", &kp, &expire_in(5))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["owner_id"], "alice");

        let (status, body) = send(&app, "GET", "/entries/data-1", String::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "ocean temperature series");
    }

    #[tokio::test]
    async fn duplicate_data_id_conflicts() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let kp = register_identity(&dir, "alice").await;

        let (status, _) =
            send(&app, "POST", "/entries", publish_body("data-1", "alice", &kp, &expire_in(5))).await;
        assert_eq!(status, StatusCode::CREATED);

        // Valid signature both times; uniqueness still rejects the second.
        let (status, body) =
            send(&app, "POST", "/entries", publish_body("data-1", "alice", &kp, &expire_in(5))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_id");
    }

    #[tokio::test]
    async fn expired_publish_rejected() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let kp = register_identity(&dir, "alice").await;

        let stale = to_utc_string(Utc::now() - Duration::seconds(2));
        let (status, body) =
            send(&app, "POST", "/entries", publish_body("data-1", "alice", &kp, &stale)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "expired");
    }

    #[tokio::test]
    async fn forged_signature_rejected() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        register_identity(&dir, "alice").await;
        let imposter = Keypair::generate();

        let (status, body) =
            send(&app, "POST", "/entries", publish_body("data-1", "alice", &imposter, &expire_in(5))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "invalid_signature");
    }

    #[tokio::test]
    async fn unregistered_owner_rejected() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let kp = Keypair::generate();

        let (status, body) =
            send(&app, "POST", "/entries", publish_body("data-1", "nobody", &kp, &expire_in(5))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn directory_outage_is_bad_gateway() {
        // Point at a port nothing listens on.
        let app = test_app("http://127.0.0.1:1").await;
        let kp = Keypair::generate();

        let (status, body) =
            send(&app, "POST", "/entries", publish_body("data-1", "alice", &kp, &expire_in(5))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "directory_unavailable");
    }

    #[tokio::test]
    async fn retract_requires_ownership() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let alice = register_identity(&dir, "alice").await;
        let mallory = register_identity(&dir, "mallory").await;

        send(&app, "POST", "/entries", publish_body("data-1", "alice", &alice, &expire_in(5))).await;

        // Mallory's signature verifies against mallory's key, but she does
        // not own the entry.
        let (status, body) =
            send(&app, "DELETE", "/entries/data-1", retract_body("data-1", "mallory", &mallory, &expire_in(5))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        let (status, _) =
            send(&app, "DELETE", "/entries/data-1", retract_body("data-1", "alice", &alice, &expire_in(5))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/entries/data-1", String::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn retract_missing_is_not_found() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let kp = register_identity(&dir, "alice").await;

        let (status, _) =
            send(&app, "DELETE", "/entries/ghost", retract_body("ghost", "alice", &kp, &expire_in(5))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn keyword_search_is_case_insensitive_substring() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let kp = register_identity(&dir, "alice").await;

        send(&app, "POST", "/entries", publish_body("data-1", "alice", &kp, &expire_in(5))).await;

        let (status, body) = send(&app, "GET", "/search/keyword/TEMPERATURE", String::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["data_id"], "data-1");

        let (_, body) = send(&app, "GET", "/search/keyword/glacier", String::new()).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn owner_search_lists_only_that_owner() {
        let dir = spawn_directory().await;
        let app = test_app(&dir).await;
        let alice = register_identity(&dir, "alice").await;
        let bob = register_identity(&dir, "bob").await;

        send(&app, "POST", "/entries", publish_body("data-a", "alice", &alice, &expire_in(5))).await;
        send(&app, "POST", "/entries", publish_body("data-b", "bob", &bob, &expire_in(5))).await;

        let (status, body) = send(&app, "GET", "/search/owner/alice", String::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["data_id"], "data-a");
    }
}
