//! The signed-in user's session context.
//!
//! A session exists from sign-in to sign-out. It owns the user's history and
//! the generator state, and funnels the outcome of every user action through
//! both.

use lumina_core::{GeneratedPage, GeneratorEvent, GeneratorState, PageId, PublicId, User};

use crate::cache::{CacheError, HistoryStore, SessionCache};

/// State belonging to the active user.
pub struct Session {
    user: User,
    history: SessionCache,
    generator: GeneratorState,
}

impl Session {
    /// Start a session and load the user's history.
    pub fn start(user: User, store: HistoryStore) -> Self {
        let history = SessionCache::open(store, user.id.clone());
        Self {
            user,
            history,
            generator: GeneratorState::Idle,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn history(&self) -> &SessionCache {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut SessionCache {
        &mut self.history
    }

    pub fn generator(&self) -> &GeneratorState {
        &self.generator
    }

    /// Hand the session to another user without going through sign-out.
    pub fn switch_user(&mut self, user: User) {
        self.generator = GeneratorState::Idle;
        self.history.switch_user(user.id.clone());
        self.user = user;
    }

    fn dispatch(&mut self, event: GeneratorEvent) {
        let current = std::mem::take(&mut self.generator);
        self.generator = current.apply(event);
    }

    fn shows(&self, id: &PageId) -> bool {
        self.generator.page().is_some_and(|p| p.id() == id)
    }

    /// A prompt was submitted. Returns `false` if a generation is already running.
    pub fn generation_started(&mut self, prompt: &str) -> bool {
        if matches!(self.generator, GeneratorState::Generating { .. }) {
            return false;
        }
        self.dispatch(GeneratorEvent::Submitted {
            prompt: prompt.to_string(),
        });
        true
    }

    /// Save a new page to history and show it.
    pub fn generation_succeeded(&mut self, page: GeneratedPage) -> Result<(), CacheError> {
        if let Err(e) = self.history.append(page.clone()) {
            self.dispatch(GeneratorEvent::GenerationFailed(e.to_string()));
            return Err(e);
        }
        self.dispatch(GeneratorEvent::Generated(page));
        Ok(())
    }

    pub fn generation_failed(&mut self, message: impl Into<String>) {
        self.dispatch(GeneratorEvent::GenerationFailed(message.into()));
    }

    /// Mark a publication as in flight.
    pub fn publish_started(&mut self, id: &PageId) {
        if self.shows(id) {
            self.dispatch(GeneratorEvent::PublishStarted);
        }
    }

    /// Stitch a new public id onto the stored page.
    ///
    /// Returns the updated page, or `None` if it was deleted meanwhile.
    pub fn publish_succeeded(
        &mut self,
        id: &PageId,
        public_id: PublicId,
    ) -> Result<Option<GeneratedPage>, CacheError> {
        let updated = match self.history.get(id).cloned() {
            Some(page) => {
                let updated = page.with_public_id(public_id.clone());
                if let Err(e) = self.history.replace(updated.clone()) {
                    self.publish_failed(id, e.to_string());
                    return Err(e);
                }
                Some(updated)
            }
            None => None,
        };

        if self.shows(id) {
            self.dispatch(GeneratorEvent::Published(public_id));
        }
        Ok(updated)
    }

    pub fn publish_failed(&mut self, id: &PageId, message: impl Into<String>) {
        if self.shows(id) {
            self.dispatch(GeneratorEvent::PublishFailed(message.into()));
        }
    }

    /// Session teardown.
    pub fn end(mut self) {
        self.dispatch(GeneratorEvent::Reset);
        tracing::debug!("Session for {} ended", self.user.id);
    }
}
