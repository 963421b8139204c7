//! In-memory doubles and a request harness for router tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::sync::Notify;
use tower::ServiceExt;

use lumina_core::{GeneratorState, PageSource, Prompt};
use lumina_gateway::{CompletionGateway, GatewayError};
use lumina_store::{HistoryStore, LocalIdentity, MemoryCache, MemoryDocumentStore};

use crate::routes::create_router;
use crate::session::{SessionToken, SESSION_COOKIE};
use crate::state::AppState;

pub(crate) fn source(title: &str) -> PageSource {
    PageSource {
        title: title.to_string(),
        markup: "<section>...</section>".to_string(),
        style: String::new(),
        script: String::new(),
    }
}

/// Gateway that replays queued outcomes, optionally waiting for a release.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<PageSource, GatewayError>>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then(self, outcome: Result<PageSource, GatewayError>) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
        self
    }

    /// Hold every call until the returned handle is notified.
    pub(crate) fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<PageSource, GatewayError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Upstream("script exhausted".to_string())))
    }
}

/// One browser talking to the router. Keeps the session cookie it is given.
pub(crate) struct Harness {
    pub state: Arc<AppState>,
    pub documents: Arc<MemoryDocumentStore>,
    pub history: HistoryStore,
    router: Router,
    cookie: Mutex<Option<String>>,
}

impl Harness {
    pub(crate) fn new(gateway: ScriptedGateway) -> Self {
        let documents = Arc::new(MemoryDocumentStore::new());
        let identity = Arc::new(LocalIdentity::new(documents.clone()));
        let history = HistoryStore::new(Arc::new(MemoryCache::new()));

        let state = Arc::new(
            AppState::new(
                identity,
                Arc::new(gateway),
                documents.clone(),
                history.clone(),
                "http://lumina.test/",
            )
            .unwrap(),
        );

        Self {
            router: create_router(state.clone()),
            state,
            documents,
            history,
            cookie: Mutex::new(None),
        }
    }

    /// Another browser against the same server, without a session.
    pub(crate) fn other_client(&self) -> Self {
        Self {
            state: self.state.clone(),
            documents: self.documents.clone(),
            history: self.history.clone(),
            router: self.router.clone(),
            cookie: Mutex::new(None),
        }
    }

    /// The session token this client currently holds.
    pub(crate) fn token(&self) -> Option<SessionToken> {
        let cookie = self.cookie.lock().unwrap().clone()?;
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(header::COOKIE, cookie.parse().unwrap());
        SessionToken::from_headers(&headers)
    }

    fn remember(&self, headers: &axum::http::HeaderMap) {
        let Some(set) = headers.get(header::SET_COOKIE) else {
            return;
        };
        let set = set.to_str().unwrap();
        let pair = set.split(';').next().unwrap().trim();
        let mut jar = self.cookie.lock().unwrap();
        *jar = match pair.strip_prefix(&format!("{}=", SESSION_COOKIE)) {
            Some("") | None => None,
            Some(_) => Some(pair.to_string()),
        };
    }

    pub(crate) async fn raw(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let mut request = Request::builder().method(method).uri(uri);
        let cookie = self.cookie.lock().unwrap().clone();
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        self.remember(&headers);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, bytes)
    }

    pub(crate) async fn json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.raw(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub(crate) async fn text(&self, uri: &str) -> (StatusCode, String) {
        let (status, _, bytes) = self.raw("GET", uri, None).await;
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Create an account `{name}@example.com` and sign it in.
    pub(crate) async fn sign_up(&self, name: &str) -> Value {
        let (status, user) = self
            .json(
                "POST",
                "/api/auth/signup",
                Some(serde_json::json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "password": "secret1",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", user);
        user
    }

    /// Poll until this client's generator reaches a state matching `pred`.
    pub(crate) async fn wait_for(&self, pred: impl Fn(&GeneratorState) -> bool) {
        let token = self.token().expect("client is not signed in");
        for _ in 0..200 {
            if pred(&self.state.generator(&token).await) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("generator never reached the expected state");
    }
}
