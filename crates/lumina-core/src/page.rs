//! Generated pages, their public copies, and the users that own them.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prompt::Prompt;

/// Current time at the millisecond precision used when persisting.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Identifier of a generated page, assigned once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a public copy. Assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(String);

impl PublicId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PublicId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PublicId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a user, owned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed-in user as mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "name")]
    pub display_name: String,
    pub email: String,
}

impl User {
    /// Build a user, deriving a display name when the provider has none.
    ///
    /// Falls back to the local part of the email, then to `"User"`.
    pub fn new(id: UserId, display_name: Option<&str>, email: &str) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| email.split('@').next().filter(|local| !local.is_empty()))
            .unwrap_or("User")
            .to_string();

        Self {
            id,
            display_name,
            email: email.to_string(),
        }
    }
}

/// The four fragments produced by one completion.
///
/// Contents are opaque: nothing here checks that the markup, stylesheet or
/// script are well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSource {
    /// Document title
    pub title: String,

    /// Body-level markup
    #[serde(rename = "html")]
    pub markup: String,

    /// Stylesheet rules
    #[serde(rename = "css")]
    pub style: String,

    /// Behavioural script
    #[serde(rename = "js")]
    pub script: String,
}

/// A generated landing page in a user's private history.
///
/// Only `public_id` can change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPage {
    id: PageId,
    prompt: String,
    #[serde(flatten)]
    source: PageSource,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    owner_id: UserId,
    #[serde(rename = "publishedId", default, skip_serializing_if = "Option::is_none")]
    public_id: Option<PublicId>,
}

impl GeneratedPage {
    /// Create a page from a successful completion.
    pub fn create(prompt: &Prompt, source: PageSource, owner_id: UserId) -> Self {
        Self {
            id: PageId::generate(),
            prompt: prompt.as_str().to_string(),
            source,
            created_at: now_millis(),
            owner_id,
            public_id: None,
        }
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn source(&self) -> &PageSource {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.source.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn public_id(&self) -> Option<&PublicId> {
        self.public_id.as_ref()
    }

    pub fn is_published(&self) -> bool {
        self.public_id.is_some()
    }

    /// Attach the identifier of a public copy.
    ///
    /// A later publish replaces the stored identifier with the newer one; the
    /// field is never cleared.
    pub fn with_public_id(mut self, public_id: PublicId) -> Self {
        self.public_id = Some(public_id);
        self
    }
}

/// A published, read-only snapshot of a generated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPage {
    #[serde(flatten)]
    pub source: PageSource,
    pub prompt: String,
    /// Publish time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub original_id: PageId,
}

impl PublishedPage {
    /// Copy the publishable fields of a page.
    pub fn snapshot(page: &GeneratedPage, owner_id: &UserId) -> Self {
        Self {
            source: page.source.clone(),
            prompt: page.prompt.clone(),
            created_at: now_millis(),
            user_id: owner_id.clone(),
            original_id: page.id.clone(),
        }
    }

    pub fn title(&self) -> &str {
        &self.source.title
    }
}
