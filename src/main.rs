#[macro_use]
extern crate tracing;

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use axum::{Router, extract::FromRef, http::StatusCode};

use axum_extra::middleware::option_layer;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

mod api;
mod auth;
mod config;
mod db;
mod error;
mod middleware;
mod trace;
mod util;

#[cfg(test)]
mod test_utils;

pub use config::CONFIG;
pub use error::Error;

use auth::{AuthManager, AuthResolver, TokenService};
use db::{CredentialStore, SqliteCredentialStore};

pub type DbPool = deadpool_diesel::sqlite::Pool;
pub type DbConn = deadpool_diesel::sqlite::Object;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    launch_info();
    dotenv().ok();
    if let Err(err) = trace::init(&CONFIG.log) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    db::run_migrations(&CONFIG.database_url)
        .map_err(|err| format!("failed to run database migrations: {err}"))?;
    let pool = init_dbpool(&CONFIG.database_url)?;
    let state = AppState::new(&CONFIG.auth, Arc::new(SqliteCredentialStore::new(pool)))?;
    let app = app(state, CONFIG.debug);

    let listener = TcpListener::bind(CONFIG.addr)
        .await
        .map_err(|err| format!("failed to bind {}: {err}", CONFIG.addr))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| format!("failed to read local address: {err}"))?;
    info!("listening on http://{}", local_addr);

    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    tokio::select! {
        result = axum::serve(listener, service) => {
            if let Err(err) = result {
                error!("server error: {}", err);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    };
    Ok(())
}

#[derive(FromRef, Clone)]
pub struct AppState {
    pub manager: Arc<AuthManager>,
    pub resolver: Arc<AuthResolver>,
}

impl AppState {
    pub fn new(auth: &config::Auth, store: Arc<dyn CredentialStore>) -> Result<Self, String> {
        let tokens = Arc::new(TokenService::new(auth)?);
        let manager = AuthManager::new(store.clone(), tokens.clone())?;
        let resolver = AuthResolver::new(tokens, store);
        Ok(Self {
            manager: Arc::new(manager),
            resolver: Arc::new(resolver),
        })
    }
}

pub fn app(state: AppState, debug: bool) -> Router {
    let cors = if debug {
        Some(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods(Any)
                .allow_origin(Any),
        )
    } else {
        None
    };
    let cors = option_layer(cors);
    let layer = ServiceBuilder::new()
        .layer(middleware::TraceLayer)
        .layer(cors);

    Router::new()
        .nest("/api", api::routes(&state))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(layer)
        .with_state(state)
}

pub fn init_dbpool(database_url: &str) -> Result<DbPool, String> {
    let manager =
        deadpool_diesel::sqlite::Manager::new(database_url, deadpool_diesel::Runtime::Tokio1);
    deadpool_diesel::sqlite::Pool::builder(manager)
        .build()
        .map_err(|err| format!("failed to build database pool: {err}"))
}

fn launch_info() {
    println!();
    println!(
        "=================== Starting tokengate {} ===================",
        env!("CARGO_PKG_VERSION")
    );
    println!();
}
