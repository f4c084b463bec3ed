//! Key directory service: authoritative mapping from identity to current
//! public key.
//!
//! Leaf component of the datafed federation: every other service resolves
//! a claimed identity's key here before verifying any signature. State
//! machine per identity: absent, registered, absent again (re-registration
//! after deletion is allowed; no history is kept, and there is no rotation
//! operation, so rotation is delete + re-register).

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

use axum::{Router, routing::get};

use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/keys",
            get(handlers::list_keys)
                .post(handlers::register_key)
                .delete(handlers::remove_key),
        )
        .route("/keys/{identity}", get(handlers::resolve_key))
        .with_state(state)
}
