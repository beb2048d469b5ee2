//! HTTP handlers for registration, login, profile updates and direct
//! messages, plus the router that wires them together.

pub mod auth;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod profile;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tracing::error;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

/// All routes. Cross-cutting layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/update-profile-picture", post(profile::update_profile_picture))
        .route("/change-password", post(profile::change_password))
        .route("/send", post(messages::send_message))
        .route("/messages/{user_id}", get(messages::get_conversation))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "Verse backend running"
}

/// Run store access and password hashing off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.to_string())
    })?
}
