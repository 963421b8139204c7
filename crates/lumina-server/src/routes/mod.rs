//! HTTP routes for the Lumina server.

pub mod auth;
pub mod pages;
pub mod public;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Creates the application router with all routes mounted.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(public::index))
        .route("/preview/{token}", get(public::show_preview).delete(public::release_preview))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        .route("/session", get(auth::session))
        .route("/generate", post(pages::generate))
        .route("/history", get(pages::list).delete(pages::clear))
        .route("/history/{id}", delete(pages::remove))
        .route("/history/{id}/publish", post(pages::publish))
        .route("/history/{id}/preview", post(pages::preview))
        .route("/history/{id}/export", get(pages::export))
}
