use serde::{Deserialize, Serialize};

/// A locally registered data resource. Owns its grants: deleting the
/// resource deletes every grant under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalResource {
    pub data_id: String,
    pub admin_id: String,
    pub description: String,
    pub endpoint: String,
    pub created_at: String,
}

/// A time-bound capability: `grantee_id` may be told about `data_id` until
/// `expires_at`. At most one grant per (resource, grantee) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub data_id: String,
    pub grantee_id: String,
    pub expires_at: String,
    pub created_at: String,
}

/// Signed resource registration. Signed message:
/// `data_id‖description‖admin_id‖endpoint‖expire_time`.
/// (Field order differs from the federated catalog's publish; both sides
/// of the wire must use this one.)
#[derive(Debug, Clone, Deserialize)]
pub struct PublishResourceRequest {
    pub data_id: String,
    pub admin_id: String,
    pub description: String,
    pub endpoint: String,
    pub signature: String,
    pub expire_time: String,
}

/// Signed grant issuance. Signed message:
/// `data_id‖grantee_id‖expires_at‖expire_time`, signed by the *resource's
/// administrator*; the grantee never signs.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantRequest {
    pub data_id: String,
    pub grantee_id: String,
    pub expires_at: String,
    pub signature: String,
    pub expire_time: String,
}

/// Signed read of a resource or its grant table. Signed message is the
/// `expire_time` alone; authorization comes from matching the stored
/// administrator.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedReadRequest {
    pub admin_id: String,
    pub signature: String,
    pub expire_time: String,
}

/// Signed resource revocation. Signed message:
/// `data_id‖description‖admin_id‖endpoint‖expire_time`. The request fields
/// must byte-match the stored record so a stale request cannot delete the
/// wrong logical resource.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeResourceRequest {
    pub admin_id: String,
    pub description: String,
    pub endpoint: String,
    pub signature: String,
    pub expire_time: String,
}

/// Signed grant revocation. Signed message: `data_id‖grantee_id‖expire_time`.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeGrantRequest {
    pub signature: String,
    pub expire_time: String,
}

/// Grant listing, filtered to grants that are still valid.
#[derive(Debug, Serialize)]
pub struct GrantsResponse {
    pub data_id: String,
    pub count: usize,
    pub grants: Vec<AccessGrant>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
