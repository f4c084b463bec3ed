//! Client for the key directory service.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// One identity's entry in the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    pub identity: String,
    pub public_key: String,
    pub registered_at: String,
}

/// Signed self-registration / removal request. The signed message is
/// `identity‖public_key‖expire_time` and is verified against the submitted
/// key itself (proof of possession).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedKeyRequest {
    pub identity: String,
    pub public_key: String,
    pub signature: String,
    pub expire_time: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: String,
    message: String,
}

#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Resolve an identity to its current PEM public key.
    ///
    /// `NotFound` means the identity truly has no live key; `Unavailable`
    /// means the directory could not answer; callers must not conflate the
    /// two.
    pub async fn resolve(&self, identity: &str) -> Result<String, ClientError> {
        let url = format!("{}/keys/{identity}", self.base_url);
        let res = self.http.get(&url).send().await.map_err(transport)?;
        if res.status().is_success() {
            let record: KeyRecord = res.json().await.map_err(transport)?;
            Ok(record.public_key)
        } else {
            Err(classify(res).await)
        }
    }

    pub async fn register(&self, request: &SignedKeyRequest) -> Result<(), ClientError> {
        let url = format!("{}/keys", self.base_url);
        let res = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        if res.status().is_success() {
            Ok(())
        } else {
            Err(classify(res).await)
        }
    }

    pub async fn remove(&self, request: &SignedKeyRequest) -> Result<(), ClientError> {
        let url = format!("{}/keys", self.base_url);
        let res = self
            .http
            .delete(&url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        if res.status().is_success() {
            Ok(())
        } else {
            Err(classify(res).await)
        }
    }

    /// Unauthenticated enumeration of all registered keys.
    pub async fn list(&self) -> Result<Vec<KeyRecord>, ClientError> {
        let url = format!("{}/keys", self.base_url);
        let res = self.http.get(&url).send().await.map_err(transport)?;
        if res.status().is_success() {
            res.json().await.map_err(transport)
        } else {
            Err(classify(res).await)
        }
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Unavailable(err.to_string())
}

pub(crate) async fn classify(res: reqwest::Response) -> ClientError {
    let status = res.status();
    let message = match res.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    match status.as_u16() {
        404 => ClientError::NotFound,
        409 => ClientError::Conflict,
        s if s >= 500 => ClientError::Unavailable(message),
        _ => ClientError::Rejected(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use datafed_auth::{Keypair, canonical, to_utc_string};

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

    fn signed_request(identity: &str, kp: &Keypair) -> SignedKeyRequest {
        let pem = kp.public_key_pem().unwrap();
        let exp = to_utc_string(Utc::now() + Duration::minutes(5));
        let msg = canonical::message(&[identity, &pem, &exp]);
        SignedKeyRequest {
            identity: identity.to_string(),
            public_key: pem,
            signature: kp.sign_base64(&msg),
            expire_time: exp,
        }
    }

    #[tokio::test]
    async fn register_resolve_remove_lifecycle() {
        let client = DirectoryClient::new(spawn_directory().await);
        let kp = Keypair::generate();
        let req = signed_request("alice", &kp);

        client.register(&req).await.unwrap();
        let resolved = client.resolve("alice").await.unwrap();
        assert_eq!(resolved, req.public_key);
        assert_eq!(client.list().await.unwrap().len(), 1);

        client.remove(&req).await.unwrap();
        assert!(matches!(
            client.resolve("alice").await,
            Err(ClientError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_conflict() {
        let client = DirectoryClient::new(spawn_directory().await);
        let req = signed_request("bob", &Keypair::generate());

        client.register(&req).await.unwrap();
        let err = client.register(&req).await.unwrap_err();
        assert!(matches!(err, ClientError::Conflict));
    }

    #[tokio::test]
    async fn outage_is_unavailable_not_not_found() {
        let client = DirectoryClient::new("http://127.0.0.1:1");
        let err = client.resolve("anyone").await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable(_)));
    }
}
