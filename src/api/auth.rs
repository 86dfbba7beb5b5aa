use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ValidatedJson;
use crate::{AppState, Error, auth::AuthManager, db::User};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(login))
}

/// Routes that need a resolved [`User`] in the request extensions.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/validate-token", get(validate_token))
        .route("/users/me", get(current_user))
}

#[derive(Deserialize, Validate)]
struct RegisterRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
}

#[derive(Deserialize, Validate)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct UserResponse {
    id: i32,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at.and_utc(),
        }
    }
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ValidateTokenResponse {
    valid: bool,
    user_id: i32,
}

async fn register(
    State(auth): State<Arc<AuthManager>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<UserResponse>, Error> {
    let user = auth.register(&request.email, &request.password).await?;
    Ok(Json(user.into()))
}

async fn login(
    State(auth): State<Arc<AuthManager>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, Error> {
    let token = auth.authenticate(&request.email, &request.password).await?;
    Ok(Json(TokenResponse {
        access_token: token.token,
        token_type: "bearer",
        expires_at: token.expires_at,
    }))
}

async fn validate_token(Extension(user): Extension<User>) -> Json<ValidateTokenResponse> {
    Json(ValidateTokenResponse {
        valid: true,
        user_id: user.id,
    })
}

async fn current_user(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(user.into())
}
