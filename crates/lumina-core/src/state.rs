//! State machines for the generator panel and the public viewer.
//!
//! Each machine is a plain value with an `apply` function from the current
//! state and an event to the next state. Events that make no sense in the
//! current state leave it unchanged.

use serde::Serialize;

use crate::page::{GeneratedPage, PublicId, PublishedPage};

/// Viewer message when the identifier resolves to nothing.
pub const NOT_FOUND_MESSAGE: &str = "Page not found or has been removed.";

/// Viewer message when the lookup itself failed.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load page.";

/// Publication progress for the page shown in the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishState {
    Unpublished,
    Publishing,
    Published { public_id: PublicId },
    Failed { message: String },
}

/// What the generator panel is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GeneratorState {
    #[default]
    Idle,
    Generating { prompt: String },
    Ready { page: GeneratedPage, publish: PublishState },
    Failed { message: String },
}

/// Inputs to the generator state machine.
#[derive(Debug, Clone)]
pub enum GeneratorEvent {
    /// A prompt was submitted
    Submitted { prompt: String },

    /// The completion produced a page
    Generated(GeneratedPage),

    /// The completion failed
    GenerationFailed(String),

    /// Publication of the current page started
    PublishStarted,

    /// Publication succeeded
    Published(PublicId),

    /// Publication failed
    PublishFailed(String),

    /// Session ended
    Reset,
}

impl GeneratorState {
    /// Compute the next state.
    pub fn apply(self, event: GeneratorEvent) -> Self {
        use GeneratorEvent as E;

        match (self, event) {
            (_, E::Reset) => Self::Idle,

            // One generation at a time.
            (state @ Self::Generating { .. }, E::Submitted { .. }) => state,
            (_, E::Submitted { prompt }) => Self::Generating { prompt },

            (Self::Generating { .. }, E::Generated(page)) => {
                let publish = match page.public_id() {
                    Some(id) => PublishState::Published {
                        public_id: id.clone(),
                    },
                    None => PublishState::Unpublished,
                };
                Self::Ready { page, publish }
            }
            (Self::Generating { .. }, E::GenerationFailed(message)) => Self::Failed { message },

            (Self::Ready { page, publish }, E::PublishStarted)
                if publish != PublishState::Publishing =>
            {
                Self::Ready {
                    page,
                    publish: PublishState::Publishing,
                }
            }
            (
                Self::Ready {
                    page,
                    publish: PublishState::Publishing,
                },
                E::Published(public_id),
            ) => Self::Ready {
                page: page.with_public_id(public_id.clone()),
                publish: PublishState::Published { public_id },
            },
            (
                Self::Ready {
                    page,
                    publish: PublishState::Publishing,
                },
                E::PublishFailed(message),
            ) => Self::Ready {
                page,
                publish: PublishState::Failed { message },
            },

            (state, _) => state,
        }
    }

    /// The page currently shown, if any.
    pub fn page(&self) -> Option<&GeneratedPage> {
        match self {
            Self::Ready { page, .. } => Some(page),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Generating { .. }
                | Self::Ready {
                    publish: PublishState::Publishing,
                    ..
                }
        )
    }
}

/// What the public viewer is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewerState {
    #[default]
    Loading,
    Loaded(PublishedPage),
    Unavailable(String),
}

/// Outcome of one public lookup.
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    Resolved(PublishedPage),
    NotFound,
    FetchFailed,
}

impl ViewerState {
    /// Compute the next state. Only `Loading` reacts; there is no retry.
    pub fn apply(self, event: ViewerEvent) -> Self {
        match (self, event) {
            (Self::Loading, ViewerEvent::Resolved(page)) => Self::Loaded(page),
            (Self::Loading, ViewerEvent::NotFound) => {
                Self::Unavailable(NOT_FOUND_MESSAGE.to_string())
            }
            (Self::Loading, ViewerEvent::FetchFailed) => {
                Self::Unavailable(FETCH_FAILED_MESSAGE.to_string())
            }
            (state, _) => state,
        }
    }
}
