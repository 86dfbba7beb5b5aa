use axum::{
    Json, Router,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{AppState, Error, middleware::AuthLayer};

mod auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    let auth_layer = AuthLayer::new(state.resolver.clone());
    let protected_routes = auth::protected_routes().route_layer(auth_layer);

    Router::new()
        .merge(auth::routes())
        .merge(protected_routes)
        .fallback(|| async { StatusCode::NOT_FOUND })
}

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::InvalidInput(rejection.body_text()))?;
        value
            .validate()
            .map_err(|err| Error::InvalidInput(err.to_string()))?;
        Ok(Self(value))
    }
}
