use async_trait::async_trait;

use super::{NewUser, User};
use crate::{DbPool, Error};

/// Persistence for user records, keyed by email.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Fails with [`Error::DuplicateUser`] when the email is already taken.
    async fn create(&self, user: NewUser) -> Result<User, Error>;
}

#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: DbPool,
}

impl SqliteCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let conn = self.pool.get().await?;
        User::find_by_email(&conn, email).await
    }

    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let conn = self.pool.get().await?;
        User::insert(&conn, user).await
    }
}
