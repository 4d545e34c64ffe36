use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, User, UserPatch, UserStore};

/// In-process store keyed by user id. Reads clone records out so nothing
/// holds the lock across an await; writes take the lock exclusively, which
/// keeps the duplicate-email check and the insert atomic.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut page: Vec<User> = users.values().cloned().collect();
        page.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if let Some(new_email) = &patch.email {
            if users.values().any(|u| u.id != id && u.email == *new_email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(phone) = patch.phone {
            user.phone = phone;
        }
        if let Some(avatar_url) = patch.avatar_url {
            user.avatar_url = avatar_url;
        }
        if let Some(is_admin) = patch.is_admin {
            user.is_admin = is_admin;
        }
        if let Some(is_super_admin) = patch.is_super_admin {
            user.is_super_admin = is_super_admin;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(email: &str) -> User {
        User::new("Test User", email, "$argon2id$fake-hash", "555-0100")
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = MemoryStore::new();
        let user = store.insert(sample("ada@example.com")).await.unwrap();

        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        let by_email = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_rejected_and_original_untouched() {
        let store = MemoryStore::new();
        let first = store.insert(sample("ada@example.com")).await.unwrap();

        let mut second = sample("ada@example.com");
        second.name = "Impostor".to_string();
        let err = store.insert(second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let kept = store.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(kept.name, "Test User");
        assert_eq!(store.list(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let store = MemoryStore::new();
        let user = store.insert(sample("ada@example.com")).await.unwrap();

        let patch = UserPatch {
            name: Some("Ada Lovelace".to_string()),
            ..UserPatch::default()
        };
        let updated = store.update_by_id(user.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.phone, user.phone);
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn update_unknown_id_returns_none() {
        let store = MemoryStore::new();
        let patch = UserPatch {
            name: Some("Ghost".to_string()),
            ..UserPatch::default()
        };
        assert!(store.update_by_id(Uuid::new_v4(), patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_to_taken_email_rejected() {
        let store = MemoryStore::new();
        store.insert(sample("ada@example.com")).await.unwrap();
        let bob = store.insert(sample("bob@example.com")).await.unwrap();

        let patch = UserPatch {
            email: Some("ada@example.com".to_string()),
            ..UserPatch::default()
        };
        let err = store.update_by_id(bob.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_keeping_own_email_is_fine() {
        let store = MemoryStore::new();
        let user = store.insert(sample("ada@example.com")).await.unwrap();

        let patch = UserPatch {
            email: Some("ada@example.com".to_string()),
            name: Some("Ada".to_string()),
            ..UserPatch::default()
        };
        let updated = store.update_by_id(user.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "Ada");
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryStore::new();
        let user = store.insert(sample("ada@example.com")).await.unwrap();

        assert!(store.delete_by_id(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
        assert!(!store.delete_by_id(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let mut user = sample(&format!("user{i}@example.com"));
            user.created_at += time::Duration::seconds(i);
            user.updated_at = user.created_at;
            store.insert(user).await.unwrap();
        }

        let first_page = store.list(2, 0).await.unwrap();
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].email, "user4@example.com");
        assert_eq!(first_page[1].email, "user3@example.com");

        let second_page = store.list(2, 2).await.unwrap();
        assert_eq!(second_page[0].email, "user2@example.com");

        let tail = store.list(10, 4).await.unwrap();
        assert_eq!(tail.len(), 1);
    }
}
