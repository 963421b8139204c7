//! Error types for the Lumina server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use lumina_core::ValidationError;
use lumina_gateway::GatewayError;
use lumina_static::{ExportError, RenderError};
use lumina_store::{AuthError, CacheError, PublishError};

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Not signed in")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Signed-in user changed before the request completed")]
    SessionChanged,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => match e {
                AuthError::Validation(_) | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailInUse => StatusCode::CONFLICT,
                AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::SessionChanged => StatusCode::CONFLICT,
            AppError::Gateway(_) | AppError::Publish(_) => StatusCode::BAD_GATEWAY,
            AppError::Cache(_) | AppError::Render(_) | AppError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
            "Internal server error".to_string()
        } else {
            if status == StatusCode::BAD_GATEWAY {
                tracing::warn!("Upstream failure: {}", self);
            }
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
