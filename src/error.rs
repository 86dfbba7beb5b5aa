use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};

use deadpool_diesel::{InteractError, PoolError};
use diesel::result::Error as DieselError;
use serde::Serialize;
use tokio::task::JoinError;

use crate::auth::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("DeadPoolError: {0}")]
    DeadPool(DeadPoolError),
    #[error("DieselError: {0}")]
    Diesel(#[from] DieselError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("a user with this email already exists")]
    DuplicateUser,
    #[error("{reason}")]
    Unauthorized { reason: &'static str },
    #[error("{reason}")]
    Internal { reason: String },
    #[error("Tokio JoinError: {0}")]
    Join(#[from] JoinError),
}

#[derive(Serialize)]
struct ErrorJson {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            debug!(status = %status, "{}", self);
        }

        let code = self.code().map(str::to_owned);
        let mut response = (
            status,
            Json(ErrorJson {
                error: self.to_string(),
                code,
            }),
        )
            .into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl Error {
    /// The one rejection every failed credential or token check collapses into.
    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            reason: "could not validate credentials",
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::Unauthorized {
            reason: "incorrect email or password",
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::DuplicateUser => StatusCode::BAD_REQUEST,
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            Error::DeadPool(_) | Error::Diesel(_) => Some("database_error"),
            Error::InvalidInput(_) => Some("invalid_input"),
            Error::DuplicateUser => Some("duplicate_user"),
            Error::Unauthorized { .. } => Some("unauthorized"),
            Error::Internal { .. } | Error::Join(_) => Some("internal_error"),
        }
    }
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(reason) => Self::internal(reason),
            _ => Self::unauthorized(),
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DeadPoolError>,
{
    fn from(e: E) -> Self {
        Self::DeadPool(e.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeadPoolError {
    #[error("InteractError: {0}")]
    Interact(#[from] InteractError),
    #[error("PoolError: {0}")]
    Pool(#[from] PoolError),
}
