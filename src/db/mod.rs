mod migration;
mod models;
mod schema;
mod store;

pub use migration::run_migrations;
pub use models::{NewUser, User};
pub use schema::users;
pub use store::{CredentialStore, SqliteCredentialStore};
