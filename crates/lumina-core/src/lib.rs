//! Core model for Lumina landing pages.
//!
//! This crate holds the generated page record, the public copy created at
//! publish time, prompt validation, and the pure state machines that drive the
//! generator and the public viewer.

pub mod page;
pub mod prompt;
pub mod state;

pub use page::{GeneratedPage, PageId, PageSource, PublicId, PublishedPage, User, UserId};
pub use prompt::{require, Prompt, ValidationError};
pub use state::{
    GeneratorEvent, GeneratorState, PublishState, ViewerEvent, ViewerState, FETCH_FAILED_MESSAGE,
    NOT_FOUND_MESSAGE,
};
