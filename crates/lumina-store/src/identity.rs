//! Identity provider boundary and a local implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use uuid::Uuid;

use lumina_core::{require, User, UserId, ValidationError};

use crate::document::{DocumentStore, StoreError};

const ACCOUNTS: &str = "accounts";
const USERS: &str = "users";
const MIN_PASSWORD_LEN: usize = 6;

/// Errors surfaced from sign-in and sign-up. Messages are shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("Authentication failed: {0}")]
    Store(#[from] StoreError),
}

/// Sign-in, sign-up, sign-out and identity-state changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError>;

    async fn sign_out(&self);

    /// The signed-in user, if any.
    fn current(&self) -> Option<User>;

    /// Receive every identity-state change.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Account {
    uid: String,
    email: String,
    name: String,
    salt: String,
    password_hash: String,
}

/// Identity provider storing accounts in the document store.
///
/// Accounts are keyed by a digest of the normalized email and hold a salted
/// SHA-256 password digest.
pub struct LocalIdentity {
    store: Arc<dyn DocumentStore>,
    state: watch::Sender<Option<User>>,
}

impl LocalIdentity {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(None);
        Self { store, state }
    }

    fn account_key(email: &str) -> String {
        hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()))
    }

    fn hash_password(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let Some(record) = self.store.get(ACCOUNTS, &Self::account_key(email)).await? else {
            return Ok(None);
        };
        serde_json::from_value(record)
            .map(Some)
            .map_err(|e| AuthError::Store(StoreError::Serialization(e.to_string())))
    }

    fn publish_state(&self, user: Option<User>) {
        self.state.send_replace(user);
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        require("Email", email)?;
        require("Password", password)?;

        let account = self
            .find_account(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if Self::hash_password(&account.salt, password) != account.password_hash {
            return Err(AuthError::InvalidCredentials);
        }

        let user = User::new(
            UserId::from(account.uid),
            Some(account.name.as_str()),
            &account.email,
        );
        tracing::info!("Signed in {}", user.id);
        self.publish_state(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        require("Name", name)?;
        require("Email", email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if self.find_account(email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let uid = Uuid::new_v4().simple().to_string();
        let salt = Uuid::new_v4().simple().to_string();
        let email = email.trim();
        let name = name.trim();

        let account = Account {
            uid: uid.clone(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: Self::hash_password(&salt, password),
            salt,
        };
        let record = serde_json::to_value(&account)
            .map_err(|e| AuthError::Store(StoreError::Serialization(e.to_string())))?;
        self.store
            .merge(ACCOUNTS, &Self::account_key(email), record)
            .await?;

        // Mirrored profile.
        self.store
            .merge(
                USERS,
                &uid,
                json!({
                    "name": name,
                    "email": email,
                    "createdAt": Utc::now().to_rfc3339(),
                    "uid": uid,
                }),
            )
            .await?;

        let user = User::new(UserId::from(uid), Some(name), email);
        tracing::info!("Created account {}", user.id);
        self.publish_state(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) {
        if self.state.borrow().is_some() {
            tracing::info!("Signed out");
        }
        self.publish_state(None);
    }

    fn current(&self) -> Option<User> {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocumentStore;

    fn identity() -> (LocalIdentity, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::new());
        (LocalIdentity::new(store.clone()), store)
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let (identity, _) = identity();

        let created = identity
            .sign_up("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();
        identity.sign_out().await;
        assert!(identity.current().is_none());

        let signed_in = identity
            .sign_in(" ADA@example.com", "secret1")
            .await
            .unwrap();

        assert_eq!(signed_in, created);
        assert_eq!(signed_in.display_name, "Ada");
        assert_eq!(identity.current(), Some(created));
    }

    #[tokio::test]
    async fn mirrors_profile_at_sign_up() {
        let (identity, store) = identity();

        let user = identity
            .sign_up("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();

        let profile = store.get(USERS, user.id.as_str()).await.unwrap().unwrap();
        assert_eq!(profile["name"], "Ada");
        assert_eq!(profile["email"], "ada@example.com");
        assert_eq!(profile["uid"], user.id.as_str());
        assert!(profile["createdAt"].is_string());
    }

    #[tokio::test]
    async fn rejects_wrong_password_and_unknown_email() {
        let (identity, _) = identity();
        identity
            .sign_up("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();
        identity.sign_out().await;

        assert!(matches!(
            identity.sign_in("ada@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            identity.sign_in("bob@example.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(identity.current().is_none());
    }

    #[tokio::test]
    async fn validates_sign_up_input() {
        let (identity, _) = identity();

        let err = identity
            .sign_up("  ", "ada@example.com", "secret1")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        assert!(matches!(
            identity.sign_up("Ada", "ada@example.com", "12345").await,
            Err(AuthError::WeakPassword)
        ));

        identity
            .sign_up("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();
        assert!(matches!(
            identity.sign_up("Other", "ada@example.com", "secret2").await,
            Err(AuthError::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn subscribers_see_state_changes() {
        let (identity, _) = identity();
        let mut rx = identity.subscribe();

        identity
            .sign_up("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|u| u.email.as_str()),
            Some("ada@example.com")
        );

        identity.sign_out().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
