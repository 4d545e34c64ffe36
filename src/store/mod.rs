use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

/// User record as held by the store. `password_hash` only ever contains an
/// Argon2 digest and is skipped on serialization, so it cannot reach a
/// response body.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub avatar_url: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Build a fresh record around an already-derived password hash;
    /// plaintext never reaches this type. The caller normalizes the email
    /// beforehand.
    pub fn new(name: &str, email: &str, password_hash: &str, phone: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            phone: phone.to_string(),
            avatar_url: avatar_url_for(email),
            is_admin: false,
            is_super_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Gravatar URL derived from the normalized email (SHA-256 variant).
pub fn avatar_url_for(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm",
        hex::encode(digest)
    )
}

/// Partial update applied by [`UserStore::update_by_id`]; `None` fields keep
/// their stored value. `updated_at` is bumped by the store itself.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: Option<bool>,
    pub is_super_admin: Option<bool>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique-email invariant was violated at write time.
    #[error("The user already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Storage collaborator for user records. The service talks to it only
/// through this interface; each implementation serializes its own writes.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Newest-first page of users.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError>;

    /// Store a new record. Fails with [`StoreError::DuplicateEmail`] when the
    /// email is already taken.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    /// Apply a partial update; returns the updated record, or `None` when the
    /// id is unknown.
    async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;

    /// Returns whether a record was actually removed.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError>;
}
