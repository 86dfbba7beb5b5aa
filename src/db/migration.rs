use std::{error::Error, fs::create_dir_all, path::Path};

use diesel::{Connection, sqlite::SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type MigrationResult = Result<(), Box<dyn Error + Send + Sync + 'static>>;

pub fn run_migrations(database_url: &str) -> MigrationResult {
    let path = Path::new(database_url);
    if let Some(path) = path.parent() {
        if !path.as_os_str().is_empty() && !path.exists() {
            create_dir_all(path)?;
        }
    }
    let mut connection = SqliteConnection::establish(database_url)?;
    migrate(&mut connection)
}

fn migrate(connection: &mut SqliteConnection) -> MigrationResult {
    let applied = connection.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        info!("applied {} database migration(s)", applied.len());
    }
    Ok(())
}
