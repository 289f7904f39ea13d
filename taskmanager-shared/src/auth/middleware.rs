/// Request authentication
///
/// Clients send their raw auth token in the `Authorization` header (no
/// scheme prefix). [`resolve_identity`] resolves it to a user by exact match;
/// the API server's auth layer puts the resulting [`Identity`] into the
/// request extensions before any protected handler runs.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskmanager_shared::auth::middleware::{resolve_identity, AuthError};
/// use taskmanager_shared::store::MemoryStore;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("unknown"));
///
/// let result = resolve_identity(&store, &headers).await;
/// assert!(matches!(result, Err(AuthError::InvalidToken)));
/// # }
/// ```

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::models::user::User;
use crate::store::{StoreError, UserStore};

/// The authenticated caller, added to request extensions
///
/// Handlers extract it with `Extension<Identity>`.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl Identity {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable Authorization header
    #[error("missing credentials")]
    MissingCredentials,

    /// Token doesn't belong to any user
    #[error("invalid token")]
    InvalidToken,

    /// The user lookup itself failed
    #[error("user lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Reads the raw token from the Authorization header
///
/// Missing, empty and non-ASCII values all count as absent.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|token| !token.is_empty())
}

/// Resolves the request's credential to an identity
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if no token was sent
/// - `AuthError::InvalidToken` if no user holds the token
/// - `AuthError::Store` if the lookup failed
pub async fn resolve_identity(
    users: &dyn UserStore,
    headers: &HeaderMap,
) -> Result<Identity, AuthError> {
    let token = token_from_headers(headers).ok_or(AuthError::MissingCredentials)?;

    let user = users
        .find_user_by_token(token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(Identity { user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::MemoryStore;
    use axum::http::HeaderValue;

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(token).unwrap());
        headers
    }

    async fn store_with_user(token: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_user(CreateUser {
                email: "user@example.com".to_string(),
                password_hash: "test_hash".to_string(),
                auth_token: token.to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_token_from_headers() {
        assert_eq!(token_from_headers(&headers_with("abc")), Some("abc"));
        assert_eq!(token_from_headers(&headers_with("")), None);
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_resolve_identity_exact_match() {
        let store = store_with_user("secret-token").await;

        let identity = resolve_identity(&store, &headers_with("secret-token"))
            .await
            .unwrap();
        assert_eq!(identity.user.email, "user@example.com");

        let err = resolve_identity(&store, &headers_with("Bearer secret-token"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_resolve_identity_missing_header() {
        let store = store_with_user("secret-token").await;

        let err = resolve_identity(&store, &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }
}
