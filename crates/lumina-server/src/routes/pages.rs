//! Generation, history, publication, preview and export routes.
//!
//! Every route here acts on the history of the session named by the request's
//! cookie. Outbound calls run inside the request future, so a client
//! disconnect cancels them.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use lumina_core::{GeneratedPage, PageId, Prompt};
use lumina_static::ExportedProject;
use lumina_store::{public_url, Session};

use crate::error::AppError;
use crate::preview::preview_path;
use crate::session::SessionToken;
use crate::state::{Action, AppState};

/// Request body for a generation.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// Response for a publication.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub public_id: String,
    pub url: String,
}

/// Response for a preview.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub token: String,
    pub url: String,
}

fn find_page(session: &Session, id: &PageId) -> Result<GeneratedPage, AppError> {
    session
        .history()
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("page {}", id)))
}

/// POST /api/generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GeneratedPage>, AppError> {
    let prompt = Prompt::parse(req.prompt)?;

    let (owner, in_flight) = state
        .begin(&token, Action::Generation, |session| {
            if !session.generation_started(prompt.as_str()) {
                return Err(AppError::Conflict(
                    "A generation is already in progress".to_string(),
                ));
            }
            Ok(session.user().id.clone())
        })
        .await?;

    tracing::info!("Generating page for {} with {}", owner, state.gateway.name());

    match state.gateway.generate(&prompt).await {
        Ok(source) => {
            let page = GeneratedPage::create(&prompt, source, owner);
            state
                .land(in_flight, |session| {
                    session
                        .generation_succeeded(page.clone())
                        .map_err(AppError::from)
                })
                .await?;
            tracing::info!("Generated page {} ({})", page.id(), page.title());
            Ok(Json(page))
        }
        Err(e) => {
            // The gateway error is what the caller needs, even if the session moved on.
            state
                .land(in_flight, |session| {
                    session.generation_failed(e.to_string());
                    Ok(())
                })
                .await
                .ok();
            Err(e.into())
        }
    }
}

/// GET /api/history
pub async fn list(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
) -> Result<Json<Vec<GeneratedPage>>, AppError> {
    let pages = state
        .with_session(&token, |session| Ok(session.history().pages().to_vec()))
        .await?;
    Ok(Json(pages))
}

/// DELETE /api/history
pub async fn clear(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
) -> Result<StatusCode, AppError> {
    state
        .with_session(&token, |session| session.history_mut().clear().map_err(AppError::from))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/history/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = PageId::from(id);
    let removed = state
        .with_session(&token, |session| session.history_mut().remove(&id).map_err(AppError::from))
        .await?;
    if removed {
        tracing::info!("Removed page {}", id);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/history/{id}/publish
pub async fn publish(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
    Path(id): Path<String>,
) -> Result<Json<PublishResponse>, AppError> {
    let id = PageId::from(id);

    let ((owner, page), in_flight) = state
        .begin(&token, Action::Publish(id.clone()), |session| {
            let page = find_page(session, &id)?;
            session.publish_started(&id);
            Ok((session.user().id.clone(), page))
        })
        .await?;

    match state.publisher.publish(&page, &owner).await {
        Ok(public_id) => {
            let url = public_url(&state.public_url, &public_id);
            state
                .land(in_flight, |session| {
                    session
                        .publish_succeeded(&id, public_id.clone())
                        .map_err(AppError::from)
                })
                .await?;
            Ok(Json(PublishResponse {
                public_id: public_id.to_string(),
                url,
            }))
        }
        Err(e) => {
            state
                .land(in_flight, |session| {
                    session.publish_failed(&id, e.to_string());
                    Ok(())
                })
                .await
                .ok();
            Err(e.into())
        }
    }
}

/// POST /api/history/{id}/preview
pub async fn preview(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
    Path(id): Path<String>,
) -> Result<Json<PreviewResponse>, AppError> {
    let id = PageId::from(id);
    let page = state
        .with_session(&token, |session| find_page(session, &id))
        .await?;

    let document = state.renderer.assemble(page.source())?;
    let handle = state.previews.register(&token, document).await;

    Ok(Json(PreviewResponse {
        url: preview_path(&handle),
        token: handle,
    }))
}

/// GET /api/history/{id}/export
pub async fn export(
    State(state): State<Arc<AppState>>,
    token: SessionToken,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = PageId::from(id);
    let page = state
        .with_session(&token, |session| find_page(session, &id))
        .await?;

    let project = ExportedProject::build(&state.renderer, page.source())?;
    let archive = project.to_zip()?;

    tracing::info!("Exported page {} as {}", id, project.archive_name());

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", project.archive_name()),
            ),
        ],
        archive,
    ))
}
