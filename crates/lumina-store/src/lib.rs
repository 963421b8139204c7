//! Persistence and session lifecycle for Lumina.
//!
//! Wraps the external collaborators (document store, local cache, identity
//! provider) behind traits and builds the page lifecycle on top of them:
//! private history, publication, and public resolution.

pub mod cache;
pub mod document;
pub mod identity;
pub mod publish;
pub mod resolve;
pub mod session;

pub use cache::{CacheBackend, CacheError, DirCache, HistoryStore, MemoryCache, SessionCache};
pub use document::{DocumentStore, FileDocumentStore, MemoryDocumentStore, StoreError};
pub use identity::{AuthError, IdentityProvider, LocalIdentity};
pub use publish::{public_url, PublishError, Publisher, PUBLIC_ID_PARAM, PUBLISHED_PAGES};
pub use resolve::{ResolveError, Resolver};
pub use session::Session;
