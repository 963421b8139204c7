//! Sign-in, sign-up and session routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use lumina_core::{GeneratorState, User};

use crate::error::AppError;
use crate::session::{expired_cookie, SessionToken};
use crate::state::AppState;

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for signing in.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Response for the session route.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<User>,
    pub generator: GeneratorState,
}

async fn signed_in(state: &AppState, user: User, current: Option<SessionToken>) -> Response {
    let token = state.sign_in(user.clone(), current.as_ref()).await;
    ([(header::SET_COOKIE, token.cookie())], Json(user)).into_response()
}

/// POST /api/auth/signup
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    current: Option<SessionToken>,
    Json(req): Json<SignUpRequest>,
) -> Result<Response, AppError> {
    let user = state
        .identity
        .sign_up(&req.name, &req.email, &req.password)
        .await?;
    Ok(signed_in(&state, user, current).await)
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    current: Option<SessionToken>,
    Json(req): Json<SignInRequest>,
) -> Result<Response, AppError> {
    let user = state.identity.sign_in(&req.email, &req.password).await?;
    Ok(signed_in(&state, user, current).await)
}

/// POST /api/auth/signout
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    current: Option<SessionToken>,
) -> Response {
    if let Some(token) = current {
        state.sign_out(&token).await;
    }
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_cookie())],
    )
        .into_response()
}

/// GET /api/session
pub async fn session(
    State(state): State<Arc<AppState>>,
    current: Option<SessionToken>,
) -> Json<SessionResponse> {
    let (user, generator) = match current {
        Some(token) => (state.user(&token).await, state.generator(&token).await),
        None => (None, GeneratorState::default()),
    };
    Json(SessionResponse { user, generator })
}
