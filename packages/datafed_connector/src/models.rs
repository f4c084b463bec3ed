use serde::{Deserialize, Serialize};

/// A locally registered user. `secret_key` is the base64 seed of the
/// keypair generated at registration; it never leaves this service.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: String,
    pub password_hash: String,
    pub public_key: String,
    pub secret_key: String,
    pub created_at: String,
}

/// The user record as returned over the API: everything but the secret key.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub user_id: String,
    pub password_hash: String,
    pub public_key: String,
    pub created_at: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            password_hash: user.password_hash,
            public_key: user.public_key,
            created_at: user.created_at,
        }
    }
}

/// Registration payload. The password arrives pre-hashed; this service
/// never sees the cleartext.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_id: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
