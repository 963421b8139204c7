//! Shared application state and the per-client session lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use lumina_core::{GeneratorState, PageId, User, UserId};
use lumina_gateway::CompletionGateway;
use lumina_static::{PageRenderer, RenderError};
use lumina_store::{DocumentStore, HistoryStore, IdentityProvider, Publisher, Resolver, Session};

use crate::error::AppError;
use crate::preview::PreviewRegistry;
use crate::session::SessionToken;

const CANCELLED_MESSAGE: &str = "Request was cancelled";

/// An outbound call started on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Action {
    Generation,
    Publish(PageId),
}

/// A signed-in client and the calls it has in flight.
struct ClientSession {
    session: Session,
    next_ticket: u64,
    running: HashMap<Action, u64>,
}

impl ClientSession {
    fn new(session: Session) -> Self {
        Self {
            session,
            next_ticket: 0,
            running: HashMap::new(),
        }
    }

    fn begin(&mut self, action: Action) -> u64 {
        self.next_ticket += 1;
        self.running.insert(action, self.next_ticket);
        self.next_ticket
    }

    /// Retire `ticket`. Returns `false` if a newer call of the same kind
    /// replaced it.
    fn finish(&mut self, action: &Action, ticket: u64) -> bool {
        if self.running.get(action) != Some(&ticket) {
            return false;
        }
        self.running.remove(action);
        true
    }
}

/// State shared by every handler.
pub struct AppState {
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) gateway: Arc<dyn CompletionGateway>,
    pub(crate) publisher: Publisher,
    pub(crate) resolver: Resolver,
    pub(crate) renderer: PageRenderer,
    pub(crate) previews: PreviewRegistry,
    pub(crate) public_url: String,
    history: HistoryStore,
    sessions: RwLock<HashMap<SessionToken, ClientSession>>,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn CompletionGateway>,
        documents: Arc<dyn DocumentStore>,
        history: HistoryStore,
        public_url: impl Into<String>,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            identity,
            gateway,
            publisher: Publisher::new(Arc::clone(&documents)),
            resolver: Resolver::new(documents),
            renderer: PageRenderer::new()?,
            previews: PreviewRegistry::new(),
            public_url: public_url.into(),
            history,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Attach a freshly authenticated user to a client.
    ///
    /// A client without a session gets a new one. A client that signs in as
    /// somebody else hands its session over: it switches to the new user,
    /// moves to a new token and drops its previews, so calls still in flight
    /// for the old user can no longer find it. Signing in again as the same
    /// user keeps everything.
    pub async fn sign_in(&self, user: User, current: Option<&SessionToken>) -> SessionToken {
        let mut sessions = self.sessions.write().await;

        if let Some(token) = current {
            if let Some(entry) = sessions.get(token) {
                if entry.session.user().id == user.id {
                    return token.clone();
                }
            }
        }

        let token = SessionToken::generate();
        let previous = current.and_then(|old| sessions.remove_entry(old));
        let entry = match previous {
            Some((old, mut entry)) => {
                tracing::info!("Switching session {} to {}", old, user.id);
                self.previews.clear(&old).await;
                entry.session.switch_user(user);
                entry.running.clear();
                entry
            }
            None => {
                tracing::info!("Starting session {} for {}", token, user.id);
                ClientSession::new(Session::start(user, self.history.clone()))
            }
        };
        sessions.insert(token.clone(), entry);
        token
    }

    /// Tear a client's session down. Returns `false` if there was none.
    pub async fn sign_out(&self, token: &SessionToken) -> bool {
        let Some(entry) = self.sessions.write().await.remove(token) else {
            return false;
        };
        entry.session.end();
        self.previews.clear(token).await;
        tracing::info!("Ended session {}", token);
        true
    }

    /// Run `f` against a client's session.
    pub(crate) async fn with_session<T>(
        &self,
        token: &SessionToken,
        f: impl FnOnce(&mut Session) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(token).ok_or(AppError::Unauthorized)?;
        f(&mut entry.session)
    }

    /// Run `f` and mark `action` as in flight for the session.
    pub(crate) async fn begin<T>(
        self: &Arc<Self>,
        token: &SessionToken,
        action: Action,
        f: impl FnOnce(&mut Session) -> Result<T, AppError>,
    ) -> Result<(T, InFlight), AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(token).ok_or(AppError::Unauthorized)?;
        let value = f(&mut entry.session)?;
        let ticket = entry.begin(action.clone());

        Ok((
            value,
            InFlight {
                state: Arc::clone(self),
                token: token.clone(),
                owner: entry.session.user().id.clone(),
                action: Some(action),
                ticket,
            },
        ))
    }

    /// Land the result of an in-flight call.
    ///
    /// `f` only runs if the session that started the call still exists and
    /// still belongs to the same user. Until the lock is acquired the guard
    /// stays armed, so a request dropped here still settles the session.
    pub(crate) async fn land<T>(
        &self,
        in_flight: InFlight,
        f: impl FnOnce(&mut Session) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.write().await;

        let result = match sessions.get_mut(&in_flight.token) {
            Some(entry) if entry.session.user().id == in_flight.owner => {
                if let Some(action) = &in_flight.action {
                    entry.finish(action, in_flight.ticket);
                }
                f(&mut entry.session)
            }
            _ => {
                tracing::info!("Dropping result for {}: session changed", in_flight.owner);
                Err(AppError::SessionChanged)
            }
        };

        in_flight.complete();
        result
    }

    pub async fn user(&self, token: &SessionToken) -> Option<User> {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|entry| entry.session.user().clone())
    }

    pub async fn generator(&self, token: &SessionToken) -> GeneratorState {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|entry| entry.session.generator().clone())
            .unwrap_or_default()
    }

    async fn abandon(&self, token: &SessionToken, owner: &UserId, action: Action, ticket: u64) {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions
            .get_mut(token)
            .filter(|entry| &entry.session.user().id == owner)
        else {
            return;
        };

        if !entry.finish(&action, ticket) {
            tracing::debug!("Ignoring cancellation of superseded {:?}", action);
            return;
        }

        match action {
            Action::Generation => {
                tracing::info!("Generation for {} cancelled", owner);
                entry.session.generation_failed(CANCELLED_MESSAGE);
            }
            Action::Publish(id) => {
                tracing::info!("Publication of {} cancelled", id);
                entry.session.publish_failed(&id, CANCELLED_MESSAGE);
            }
        }
    }
}

/// Marks an outbound call as in flight.
///
/// The call runs inside the request future. When the client goes away that
/// future is dropped together with this guard, which then moves the session
/// state out of its busy phase.
pub(crate) struct InFlight {
    state: Arc<AppState>,
    token: SessionToken,
    owner: UserId,
    action: Option<Action>,
    ticket: u64,
}

impl InFlight {
    fn complete(mut self) {
        self.action = None;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(action) = self.action.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let state = Arc::clone(&self.state);
        let token = self.token.clone();
        let owner = self.owner.clone();
        let ticket = self.ticket;
        runtime.spawn(async move {
            state.abandon(&token, &owner, action, ticket).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::StatusCode;
    use serde_json::json;

    use lumina_core::{GeneratorState, PageId, PublishState};

    use super::Action;
    use crate::testing::{source, Harness, ScriptedGateway};

    #[tokio::test]
    async fn request_dropped_while_landing_still_settles() {
        let (gateway, gate) = ScriptedGateway::new()
            .then(Ok(source("Late")))
            .then(Ok(source("Next")))
            .gated();
        let h = Arc::new(Harness::new(gateway));
        h.sign_up("Ada").await;

        let pending = {
            let h = h.clone();
            tokio::spawn(async move {
                h.json("POST", "/api/generate", Some(json!({ "prompt": "pricing" })))
                    .await
            })
        };
        h.wait_for(|g| matches!(g, GeneratorState::Generating { .. })).await;

        // The gateway answers while the handler waits for the session.
        let sessions = h.state.sessions.write().await;
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(20)).await;
        pending.abort();
        assert!(pending.await.is_err());
        drop(sessions);

        h.wait_for(|g| matches!(g, GeneratorState::Failed { .. })).await;

        gate.notify_one();
        let (status, page) = h
            .json("POST", "/api/generate", Some(json!({ "prompt": "pricing" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["title"], "Next");
    }

    #[tokio::test]
    async fn superseded_cancellation_is_ignored() {
        let h = Harness::new(ScriptedGateway::new().then(Ok(source("Pricing"))));
        h.sign_up("Ada").await;
        let (_, page) = h
            .json("POST", "/api/generate", Some(json!({ "prompt": "pricing" })))
            .await;
        let id = PageId::from(page["id"].as_str().unwrap());
        let token = h.token().unwrap();

        let ((), first) = h
            .state
            .begin(&token, Action::Publish(id.clone()), |session| {
                session.publish_started(&id);
                Ok(())
            })
            .await
            .unwrap();
        let ((), second) = h
            .state
            .begin(&token, Action::Publish(id.clone()), |session| {
                session.publish_started(&id);
                Ok(())
            })
            .await
            .unwrap();

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            h.state.generator(&token).await,
            GeneratorState::Ready {
                publish: PublishState::Publishing,
                ..
            }
        ));

        drop(second);
        h.wait_for(|g| {
            matches!(
                g,
                GeneratorState::Ready {
                    publish: PublishState::Failed { .. },
                    ..
                }
            )
        })
        .await;
    }

    #[tokio::test]
    async fn sign_in_as_same_user_keeps_token() {
        let h = Harness::new(ScriptedGateway::new());
        h.sign_up("Ada").await;
        let token = h.token().unwrap();
        let user = h.state.user(&token).await.unwrap();

        let again = h.state.sign_in(user, Some(&token)).await;

        assert_eq!(again, token);
        assert!(h.state.sign_out(&token).await);
        assert!(!h.state.sign_out(&token).await);
        assert!(h.state.user(&token).await.is_none());
    }
}
