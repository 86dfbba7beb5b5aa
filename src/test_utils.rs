//! In-memory collaborators for unit and HTTP-level tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum_test::TestServer;

use crate::{
    AppState, Error, app,
    config::Auth as AuthConfig,
    db::{CredentialStore, NewUser, User},
};

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        secret_key: String::from("tokengate-test-secret-0123456789abcdef"),
        algorithm: String::from("HS256"),
        access_token_ttl_seconds: 900,
    }
}

/// Keyed by email, with ids handed out in insertion order.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryCredentialStore {
    pub async fn with_user(email: &str, hashed_password: &str) -> Self {
        let store = Self::default();
        store
            .create(NewUser::new(email, hashed_password.to_string()))
            .await
            .unwrap();
        store
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.email) {
            return Err(Error::DuplicateUser);
        }
        let created = User {
            id: users.len() as i32 + 1,
            email: user.email,
            hashed_password: user.hashed_password,
            created_at: user.created_at,
        };
        users.insert(created.email.clone(), created.clone());
        Ok(created)
    }
}

/// A store whose backend is always down.
pub struct UnavailableCredentialStore;

#[async_trait]
impl CredentialStore for UnavailableCredentialStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, Error> {
        Err(Error::internal("credential store unavailable"))
    }

    async fn create(&self, _user: NewUser) -> Result<User, Error> {
        Err(Error::internal("credential store unavailable"))
    }
}

pub fn test_server() -> TestServer {
    test_server_with(Arc::new(InMemoryCredentialStore::default()))
}

pub fn test_server_with(store: Arc<dyn CredentialStore>) -> TestServer {
    let state = AppState::new(&test_auth_config(), store).unwrap();
    TestServer::new(app(state, false)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_rejects_duplicates() {
        let store = InMemoryCredentialStore::with_user("alice@example.com", "hash").await;
        let second = store
            .create(NewUser::new("alice@example.com", String::from("other")))
            .await;
        assert!(matches!(second, Err(Error::DuplicateUser)));
        assert_eq!(
            store
                .find_by_email("alice@example.com")
                .await
                .unwrap()
                .unwrap()
                .hashed_password,
            "hash"
        );
    }
}
