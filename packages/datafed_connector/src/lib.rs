//! Gateway between end users and the federation.
//!
//! Registration generates a keypair on the user's behalf, self-registers it
//! with the key directory, and stores the credential locally. Subsequent
//! reads are gated by HTTP Basic auth (the password field carries the
//! pre-hashed password) and forwarded to the directory or the federated
//! catalog.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use datafed_client::{CatalogClient, DirectoryClient};

use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub directory: DirectoryClient,
    pub catalog: CatalogClient,
}

pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/users/{user_id}", get(handlers::get_user))
        .route("/directory/keys", get(handlers::list_directory_keys))
        .route("/search/{keyword}", get(handlers::search_catalog))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::basic_auth_middleware,
        ));

    Router::new()
        .route("/register", post(handlers::register_user))
        .route("/login", post(handlers::login_user))
        .merge(gated)
        .with_state(state)
}
