use serde::{Deserialize, Serialize};

/// A published data-resource descriptor. `data_id` is globally unique;
/// the owner is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub data_id: String,
    pub owner_id: String,
    pub description: String,
    pub endpoint: String,
    pub created_at: String,
}

/// Signed publish request. Signed message:
/// `data_id‖owner_id‖description‖endpoint‖expire_time`.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub data_id: String,
    pub owner_id: String,
    pub description: String,
    pub endpoint: String,
    pub signature: String,
    pub expire_time: String,
}

/// Signed retraction. Signed message: `data_id‖owner_id‖expire_time`
/// (the `data_id` comes from the request path).
#[derive(Debug, Clone, Deserialize)]
pub struct RetractRequest {
    pub owner_id: String,
    pub signature: String,
    pub expire_time: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query_type: &'static str,
    pub query_value: String,
    pub count: usize,
    pub results: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
