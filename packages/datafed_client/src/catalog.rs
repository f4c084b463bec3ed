//! Read-side client for the federated catalog, used by the connector to
//! forward authenticated searches.

use serde::{Deserialize, Serialize};

use crate::directory::classify;
use crate::error::ClientError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub data_id: String,
    pub owner_id: String,
    pub description: String,
    pub endpoint: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query_type: String,
    pub query_value: String,
    pub count: usize,
    pub results: Vec<CatalogEntry>,
}

#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Case-insensitive substring search over entry descriptions.
    pub async fn search_by_keyword(&self, keyword: &str) -> Result<SearchResponse, ClientError> {
        let url = format!("{}/search/keyword/{keyword}", self.base_url);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Unavailable(e.to_string()))?;
        if res.status().is_success() {
            res.json()
                .await
                .map_err(|e| ClientError::Unavailable(e.to_string()))
        } else {
            Err(classify(res).await)
        }
    }
}
