//! Entry page, public viewer and preview documents.
//!
//! Apart from releasing a preview, none of these routes need a signed-in
//! user. The entry page shows the caller's own history when its request
//! carries a session.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use lumina_core::{GeneratorState, PublicId, ViewerState};
use lumina_static::{ShellContext, ShellPage};
use lumina_store::public_url;

use crate::error::AppError;
use crate::preview::PREVIEW_CSP;
use crate::session::SessionToken;
use crate::state::AppState;

/// Query string of the entry URL.
#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    /// Public identifier; switches the page into viewer mode
    pub p: Option<String>,
}

/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    current: Option<SessionToken>,
    Query(query): Query<EntryQuery>,
) -> Result<Response, AppError> {
    let public_id = query.p.filter(|p| !p.trim().is_empty());

    match (public_id, current) {
        (Some(id), _) => viewer(&state, PublicId::from(id)).await,
        (None, Some(token)) => shell(&state, &token).await,
        (None, None) => Ok(Html(state.renderer.shell(&ShellContext::default())?).into_response()),
    }
}

async fn viewer(state: &AppState, id: PublicId) -> Result<Response, AppError> {
    let view = state.resolver.view(&id).await;
    let html = state.renderer.viewer(&view, "/")?;

    let status = match view {
        ViewerState::Loaded(_) => StatusCode::OK,
        _ => StatusCode::NOT_FOUND,
    };
    Ok((status, Html(html)).into_response())
}

fn status_label(generator: &GeneratorState) -> String {
    match generator {
        GeneratorState::Idle => "idle".to_string(),
        GeneratorState::Generating { .. } => "generating".to_string(),
        GeneratorState::Ready { .. } => "ready".to_string(),
        GeneratorState::Failed { message } => format!("failed ({})", message),
    }
}

async fn shell(state: &AppState, token: &SessionToken) -> Result<Response, AppError> {
    let ctx = state
        .with_session(token, |session| {
            let pages = session
                .history()
                .pages()
                .iter()
                .map(|page| ShellPage {
                    id: page.id().to_string(),
                    title: page.title().to_string(),
                    created: page.created_at().format("%Y-%m-%d %H:%M").to_string(),
                    public_url: page.public_id().map(|id| public_url(&state.public_url, id)),
                })
                .collect();

            Ok(ShellContext {
                user_name: Some(session.user().display_name.clone()),
                status: status_label(session.generator()),
                pages,
            })
        })
        .await
        .or_else(|e| match e {
            // Stale cookie from an ended session.
            AppError::Unauthorized => Ok(ShellContext::default()),
            other => Err(other),
        })?;

    Ok(Html(state.renderer.shell(&ctx)?).into_response())
}

/// GET /preview/{token}
pub async fn show_preview(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let document = state
        .previews
        .get(&token)
        .await
        .ok_or_else(|| AppError::NotFound("preview".to_string()))?;

    Ok(([(header::CONTENT_SECURITY_POLICY, PREVIEW_CSP)], Html(document)).into_response())
}

/// DELETE /preview/{token}
pub async fn release_preview(
    State(state): State<Arc<AppState>>,
    owner: SessionToken,
    Path(token): Path<String>,
) -> StatusCode {
    if state.previews.release(&owner, &token).await {
        tracing::debug!("Released preview {}", token);
    }
    StatusCode::NO_CONTENT
}
