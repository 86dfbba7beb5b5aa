use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::config::Auth as AuthConfig;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("token has no subject")]
    MissingSubject,
    #[error("failed to encode access token: {0}")]
    Encoding(String),
}

/// Signs and verifies stateless access tokens.
///
/// The secret, algorithm and default lifetime are fixed at construction.
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Deserialize)]
struct UnverifiedSubject {
    #[serde(default)]
    sub: Option<String>,
}

#[derive(Debug)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn parse_algorithm(name: &str) -> Result<Algorithm, String> {
    let algorithm = name
        .parse::<Algorithm>()
        .map_err(|_| format!("unknown token algorithm `{name}`"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(format!(
            "token algorithm `{name}` is not supported, expected one of HS256, HS384, HS512"
        )),
    }
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Result<Self, String> {
        config.validate()?;
        let algorithm = parse_algorithm(&config.algorithm)?;
        let default_ttl = config.access_token_ttl()?;
        let secret = config.secret_key.as_bytes();

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl,
        })
    }

    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<AccessToken, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError> {
        let expires_at = now
            .checked_add_signed(ttl.unwrap_or(self.default_ttl))
            .ok_or_else(|| TokenError::Encoding("token expiry is out of range".into()))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let header = Header::new(self.algorithm);
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|err| TokenError::Encoding(err.to_string()))?;

        Ok(AccessToken { token, expires_at })
    }

    /// Returns the token's subject once signature, algorithm and expiry all check out.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        let token_data =
            jsonwebtoken::decode::<UnverifiedSubject>(token, &self.decoding_key, &validation)
                .map_err(|err| match err.kind() {
                    ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
                    _ => TokenError::InvalidToken,
                })?;

        token_data
            .claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(TokenError::MissingSubject)
    }
}
