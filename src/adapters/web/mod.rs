//! Web adapter: axum router, shared state, auth middleware and handlers.

mod auth;
mod error;
mod handlers;

pub use auth::{AuthedUser, SessionGate, DEFAULT_TOKEN_TTL_SECONDS};
pub use error::ApiError;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::ports::blob_port::BlobPort;
use crate::ports::store_port::StorePort;

/// Request body cap for the upload route. Deliberately above the blob
/// store's own limit so oversized-but-plausible uploads reach the size
/// check and get a 413 with a meaningful body.
const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub struct AppState {
    pub store: Arc<dyn StorePort + Send + Sync>,
    pub blobs: Arc<dyn BlobPort + Send + Sync>,
    pub gate: SessionGate,
    pub uploads_dir: PathBuf,
}

/// Assemble the full application router.
///
/// Everything except registration, login and static upload serving sits
/// behind the bearer-auth middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(handlers::me))
        .route(
            "/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        .route(
            "/trades/{id}",
            get(handlers::get_trade)
                .put(handlers::update_trade)
                .delete(handlers::delete_trade),
        )
        .route("/dashboard/stats", get(handlers::dashboard_stats))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .with_state(state)
}
