//! User accounts
//!
//! Passwords are hashed before they reach the document store and the hash
//! never leaves this module: every public operation returns a [`User`], which
//! has no password field.

use crate::core::credentials::CredentialHasher;
use crate::core::error::{StoreError, StoreResult};
use crate::core::gateway;
use crate::core::patch::Patch;
use crate::core::query::{Document, Filter};
use crate::entities::{EntityStore, check_presence, from_document, to_document};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

pub const COLLECTION: &str = "users";

const ENTITY: &str = "user";

/// A user as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// A user as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    username: String,
    #[serde(rename = "password")]
    password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            username: record.username,
            first_name: record.first_name,
            last_name: record.last_name,
        }
    }
}

#[derive(Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    #[validate(length(min = 1, message = "A username must be supplied"))]
    pub username: String,
    #[validate(length(min = 1, message = "A password must be supplied"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    pub fn named(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = Some(first_name.to_string());
        self.last_name = Some(last_name.to_string());
        self
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

#[derive(Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[validate(length(min = 1, message = "A username must be supplied"))]
    pub username: Option<String>,
    #[validate(length(min = 1, message = "A password must be supplied"))]
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl std::fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserUpdate")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

impl Patch for UserUpdate {
    const FIELDS: &'static [&'static str] = &["username", "password", "firstName", "lastName"];
}

fn key(username: &str) -> Filter {
    Filter::eq("username", username)
}

fn taken(username: &str) -> StoreError {
    StoreError::Conflict(format!("Username \"{}\" is already taken", username))
}

async fn hash_password(hasher: Arc<dyn CredentialHasher>, password: String) -> StoreResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| StoreError::Hashing(e.to_string()))?
}

/// Validator for the `users` collection
pub struct Users<'a> {
    store: &'a EntityStore,
}

impl<'a> Users<'a> {
    pub(crate) fn new(store: &'a EntityStore) -> Self {
        Self { store }
    }

    async fn record(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.store
            .documents()
            .get(COLLECTION, &key(username))
            .await?
            .map(|doc| from_document(ENTITY, doc))
            .transpose()
    }

    /// Create an account, storing only a salted hash of the password
    pub async fn register(&self, input: NewUser) -> StoreResult<User> {
        check_presence(&input, &["username", "password"])?;

        let documents = self.store.documents();
        if documents.contains(COLLECTION, &key(&input.username)).await? {
            return Err(taken(&input.username));
        }

        let record = UserRecord {
            password_hash: hash_password(self.store.hasher.clone(), input.password).await?,
            username: input.username,
            first_name: input.first_name,
            last_name: input.last_name,
        };

        let stored = match documents
            .insert(
                COLLECTION,
                Some(&key(&record.username)),
                to_document(ENTITY, &record)?,
            )
            .await
        {
            Err(StoreError::Conflict(_)) => return Err(taken(&record.username)),
            other => other?,
        };

        tracing::debug!(username = %record.username, "Registered user");
        from_document::<UserRecord>(ENTITY, stored).map(User::from)
    }

    pub async fn update(&self, username: &str, changes: UserUpdate) -> StoreResult<User> {
        check_presence(&changes, &["username", "password"])?;

        let documents = self.store.documents();
        let current = self
            .record(username)
            .await?
            .ok_or_else(|| gateway::not_found(COLLECTION, &key(username)))?;

        let mut set = Document::new();
        let mut renamed_to = None;
        if let Some(new_username) = changes.username {
            if new_username != current.username {
                if documents.contains(COLLECTION, &key(&new_username)).await? {
                    return Err(taken(&new_username));
                }
                renamed_to = Some(new_username.clone());
            }
            set.insert("username".into(), Value::String(new_username));
        }
        if let Some(first_name) = changes.first_name {
            set.insert("firstName".into(), Value::String(first_name));
        }
        if let Some(last_name) = changes.last_name {
            set.insert("lastName".into(), Value::String(last_name));
        }
        if let Some(password) = changes.password {
            let hash = hash_password(self.store.hasher.clone(), password).await?;
            set.insert("password".into(), Value::String(hash));
        }

        if set.is_empty() {
            return Ok(current.into());
        }

        let updated = match &renamed_to {
            Some(new_username) => match documents
                .update_unique(COLLECTION, &key(username), &key(new_username), set)
                .await
            {
                Err(StoreError::Conflict(_)) => return Err(taken(new_username)),
                other => other?,
            },
            None => documents.update(COLLECTION, &key(username), set).await?,
        };
        tracing::debug!(username = %username, "Updated user");
        from_document::<UserRecord>(ENTITY, updated).map(User::from)
    }

    /// Fetch a user after checking their password
    pub async fn validate_and_get(&self, username: &str, password: &str) -> StoreResult<User> {
        let record = self
            .record(username)
            .await?
            .ok_or_else(|| StoreError::UnknownUser(username.to_string()))?;

        let hasher = self.store.hasher.clone();
        let cleartext = password.to_string();
        let hash = record.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&cleartext, &hash))
            .await
            .map_err(|e| StoreError::Hashing(e.to_string()))?;

        if !matches {
            tracing::debug!(username = %username, "Password mismatch");
            return Err(StoreError::AuthMismatch);
        }
        Ok(record.into())
    }

    pub async fn remove(&self, username: &str) -> StoreResult<User> {
        let removed = self
            .store
            .documents()
            .remove(COLLECTION, &key(username))
            .await?;
        tracing::debug!(username = %username, "Removed user");
        from_document::<UserRecord>(ENTITY, removed).map(User::from)
    }

    pub async fn get(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.record(username).await?.map(User::from))
    }

    pub async fn get_all(&self) -> StoreResult<Vec<User>> {
        self.store
            .documents()
            .get_all(COLLECTION)
            .await?
            .into_iter()
            .map(|doc| from_document::<UserRecord>(ENTITY, doc).map(User::from))
            .collect()
    }

    pub async fn contains(&self, username: &str) -> StoreResult<bool> {
        self.store
            .documents()
            .contains(COLLECTION, &key(username))
            .await
    }
}
