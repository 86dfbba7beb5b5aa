mod auth;
mod trace;

pub use auth::AuthLayer;
pub use trace::TraceLayer;
