use serde::{Deserialize, Serialize};

/// One identity's live key. Primary key = identity; at most one record per
/// identity at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    pub identity: String,
    pub public_key: String,
    pub registered_at: String,
}

/// Signed registration or removal request. The signed message is
/// `identity‖public_key‖expire_time`, verified against the *submitted*
/// public key: self-attested proof of possession of the matching private
/// key.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedKeyRequest {
    pub identity: String,
    pub public_key: String,
    pub signature: String,
    pub expire_time: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
