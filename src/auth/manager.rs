use std::sync::Arc;

use tokio::task;

use crate::{
    Error,
    db::{CredentialStore, NewUser, User},
};

use super::{
    password::{hash_password, verify_password},
    token::{AccessToken, TokenService},
};

pub struct AuthManager {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    // Verified against when the email is unknown so both login failures cost the same.
    dummy_hash: String,
}

impl AuthManager {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Result<Self, String> {
        let dummy_hash = hash_password("tokengate-dummy-password")
            .map_err(|err| format!("failed to prepare login hash: {err}"))?;
        Ok(Self {
            store,
            tokens,
            dummy_hash,
        })
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, Error> {
        let password = password.to_owned();
        let hashed_password = task::spawn_blocking(move || hash_password(&password)).await??;
        let user = self
            .store
            .create(NewUser::new(email, hashed_password))
            .await?;
        info!(user_id = user.id, "registered user");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AccessToken, Error> {
        let user = self.store.find_by_email(email).await?;
        let hash = user.as_ref().map_or_else(
            || self.dummy_hash.clone(),
            |user| user.hashed_password.clone(),
        );
        let password = password.to_owned();
        let password_ok = task::spawn_blocking(move || verify_password(&password, &hash)).await?;

        match user {
            Some(user) if password_ok => Ok(self.tokens.issue(&user.email, None)?),
            _ => Err(Error::invalid_credentials()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::test_utils::{InMemoryCredentialStore, test_auth_config};

    /// Spawns a task that flips a flag the first time the runtime gets to poll it.
    fn spawn_observer() -> Arc<AtomicBool> {
        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });
        polled
    }

    fn manager() -> (AuthManager, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new(&test_auth_config()).unwrap());
        let store = Arc::new(InMemoryCredentialStore::default());
        (AuthManager::new(store, tokens.clone()).unwrap(), tokens)
    }

    #[tokio::test]
    async fn register_hashes_password() {
        let (manager, _) = manager();
        let user = manager
            .register("alice@example.com", "s3cret-password")
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.hashed_password, "s3cret-password");
        assert!(verify_password("s3cret-password", &user.hashed_password));
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let (manager, _) = manager();
        manager
            .register("alice@example.com", "s3cret-password")
            .await
            .unwrap();
        let second = manager
            .register("alice@example.com", "other-password")
            .await;
        assert!(matches!(second, Err(Error::DuplicateUser)));
    }

    #[tokio::test]
    async fn login_issues_token_for_email() {
        let (manager, tokens) = manager();
        manager
            .register("alice@example.com", "s3cret-password")
            .await
            .unwrap();

        let issued = manager
            .authenticate("alice@example.com", "s3cret-password")
            .await
            .unwrap();
        assert_eq!(tokens.verify(&issued.token).unwrap(), "alice@example.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_alike() {
        let (manager, _) = manager();
        manager
            .register("alice@example.com", "s3cret-password")
            .await
            .unwrap();

        let wrong_password = manager
            .authenticate("alice@example.com", "not-the-password")
            .await
            .unwrap_err();
        let unknown_email = manager
            .authenticate("nobody@example.com", "s3cret-password")
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, Error::Unauthorized { .. }));
        assert!(matches!(unknown_email, Error::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn password_work_leaves_the_runtime_free() {
        let (manager, _) = manager();

        let polled = spawn_observer();
        manager
            .register("alice@example.com", "s3cret-password")
            .await
            .unwrap();
        assert!(polled.load(Ordering::SeqCst), "register hashed on the runtime thread");

        let polled = spawn_observer();
        manager
            .authenticate("alice@example.com", "s3cret-password")
            .await
            .unwrap();
        assert!(polled.load(Ordering::SeqCst), "login verified on the runtime thread");

        let polled = spawn_observer();
        manager
            .authenticate("nobody@example.com", "s3cret-password")
            .await
            .unwrap_err();
        assert!(
            polled.load(Ordering::SeqCst),
            "unknown email verified on the runtime thread"
        );
    }
}
