//! Session cookie handling.
//!
//! Sign-in and sign-up issue a random token in an HttpOnly cookie. Every
//! private route resolves its session from that cookie; requests without one
//! are anonymous.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

use crate::error::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "lumina_session";

/// Identifies one signed-in client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub(crate) fn generate() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(header::COOKIE)?.to_str().ok()?;

        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| name.trim() == SESSION_COOKIE)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }

    /// `Set-Cookie` value that hands this token to the client.
    pub(crate) fn cookie(&self) -> HeaderValue {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict",
            SESSION_COOKIE, self.0
        );
        // Tokens are hex, so this never fails.
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| expired_cookie())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Enough to correlate log lines without leaking the credential.
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "{}…", prefix)
    }
}

/// `Set-Cookie` value that removes the session cookie.
pub(crate) fn expired_cookie() -> HeaderValue {
    HeaderValue::from_static("lumina_session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
