use std::sync::Arc;

use crate::{
    Error,
    db::{CredentialStore, User},
};

use super::TokenService;

/// Turns a raw `Authorization` header into the user it authenticates.
pub struct AuthResolver {
    tokens: Arc<TokenService>,
    store: Arc<dyn CredentialStore>,
}

impl AuthResolver {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }

    /// Every authentication failure yields the same [`Error::unauthorized`];
    /// the concrete reason only reaches the debug log. Store I/O errors pass through.
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<User, Error> {
        let Some(authorization) = authorization else {
            debug!("rejecting request: missing Authorization header");
            return Err(Error::unauthorized());
        };
        let Some(token) = bearer_token(authorization) else {
            debug!("rejecting request: malformed Authorization header");
            return Err(Error::unauthorized());
        };
        let subject = self.tokens.verify(token).map_err(|err| {
            debug!("rejecting request: {}", err);
            Error::unauthorized()
        })?;

        match self.store.find_by_email(&subject).await? {
            Some(user) => Ok(user),
            None => {
                debug!("rejecting request: token subject has no user");
                Err(Error::unauthorized())
            }
        }
    }
}

fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::test_utils::{
        InMemoryCredentialStore, UnavailableCredentialStore, test_auth_config,
    };

    async fn resolver() -> (AuthResolver, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new(&test_auth_config()).unwrap());
        let store = InMemoryCredentialStore::with_user("alice@example.com", "hash").await;
        (AuthResolver::new(tokens.clone(), Arc::new(store)), tokens)
    }

    fn unauthorized_reason(result: Result<User, Error>) -> &'static str {
        match result {
            Err(Error::Unauthorized { reason }) => reason,
            Err(err) => panic!("expected unauthorized, got {err:?}"),
            Ok(user) => panic!("expected unauthorized, got user {}", user.email),
        }
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }

    #[tokio::test]
    async fn resolves_user_from_valid_token() {
        let (resolver, tokens) = resolver().await;
        let issued = tokens.issue("alice@example.com", None).unwrap();
        let header = format!("Bearer {}", issued.token);

        let user = resolver.resolve(Some(header.as_str())).await.unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn every_failure_is_the_same_unauthorized() {
        let (resolver, tokens) = resolver().await;
        let expired = tokens
            .issue_at(
                "alice@example.com",
                Some(Duration::minutes(1)),
                Utc::now() - Duration::minutes(10),
            )
            .unwrap();
        let unknown = tokens.issue("mallory@example.com", None).unwrap();

        let expected = unauthorized_reason(Err(Error::unauthorized()));
        let headers = [
            None,
            Some(String::from("Token abc")),
            Some(String::from("Bearer")),
            Some(String::from("Bearer not.a.jwt")),
            Some(format!("Bearer {}", expired.token)),
            Some(format!("Bearer {}", unknown.token)),
        ];
        for header in headers {
            let result = resolver.resolve(header.as_deref()).await;
            assert_eq!(unauthorized_reason(result), expected, "header: {header:?}");
        }
    }

    #[tokio::test]
    async fn store_failure_is_not_reported_as_unauthorized() {
        let tokens = Arc::new(TokenService::new(&test_auth_config()).unwrap());
        let resolver = AuthResolver::new(tokens.clone(), Arc::new(UnavailableCredentialStore));
        let issued = tokens.issue("alice@example.com", None).unwrap();
        let header = format!("Bearer {}", issued.token);

        let result = resolver.resolve(Some(header.as_str())).await;
        assert!(matches!(result, Err(Error::Internal { .. })), "{result:?}");
    }
}
