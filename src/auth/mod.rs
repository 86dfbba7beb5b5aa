mod manager;
mod password;
mod resolver;
mod token;

pub use manager::AuthManager;
pub use resolver::AuthResolver;
pub use token::{TokenError, TokenService, parse_algorithm};
