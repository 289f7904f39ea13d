/// Auth token issuance
///
/// [`TokenAuthority`] is the only place tokens are assigned to users. It
/// draws candidates from a [`TokenGenerator`], skips any that are already in
/// use and persists the first free one. The existence check is a shortcut;
/// a uniqueness violation reported by the store on write is handled the same
/// way as a detected collision, which keeps tokens unique when two requests
/// race for the same value.
///
/// The loop is bounded: [`MAX_ATTEMPTS_PER_LENGTH`] candidates at the
/// configured length, then the same number at twice the length, then
/// [`TokenError::Exhausted`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskmanager_shared::auth::authority::TokenAuthority;
/// use taskmanager_shared::auth::token::{RandomTokenGenerator, DEFAULT_TOKEN_LENGTH};
/// use taskmanager_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let authority = TokenAuthority::new(
///     Arc::new(RandomTokenGenerator),
///     Arc::new(MemoryStore::new()),
///     DEFAULT_TOKEN_LENGTH,
/// );
///
/// let user = authority.create_user("ada@example.com", "hash").await?;
/// let rotated = authority.issue(user.id).await?;
/// assert_ne!(user.auth_token, rotated.auth_token);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::token::TokenGenerator;
use crate::models::user::{CreateUser, User};
use crate::store::{StoreError, UserStore};

/// Candidates tried per token length before widening
pub const MAX_ATTEMPTS_PER_LENGTH: usize = 10;

/// Error type for token issuance
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Every candidate collided with an existing token
    #[error("no unique auth token found after {attempts} attempts")]
    Exhausted { attempts: usize },

    /// The store rejected the write for a reason other than a token collision
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Assigns globally unique auth tokens to users
#[derive(Clone)]
pub struct TokenAuthority {
    generator: Arc<dyn TokenGenerator>,
    users: Arc<dyn UserStore>,
    token_length: usize,
}

impl TokenAuthority {
    pub fn new(
        generator: Arc<dyn TokenGenerator>,
        users: Arc<dyn UserStore>,
        token_length: usize,
    ) -> Self {
        Self {
            generator,
            users,
            token_length,
        }
    }

    /// Lazily yields candidates: one round at the configured length, one at double
    fn candidates(&self) -> impl Iterator<Item = String> + '_ {
        (0..MAX_ATTEMPTS_PER_LENGTH * 2).map(move |attempt| {
            let length = if attempt < MAX_ATTEMPTS_PER_LENGTH {
                self.token_length
            } else {
                self.token_length * 2
            };
            self.generator.generate(length)
        })
    }

    async fn is_taken(&self, candidate: &str) -> Result<bool, StoreError> {
        let taken = self.users.token_exists(candidate).await?;
        if taken {
            warn!("Generated auth token collided with an existing one, retrying");
        }
        Ok(taken)
    }

    /// Gives the user a fresh token, revoking the previous one
    ///
    /// Returns the updated user carrying the new token.
    ///
    /// # Errors
    ///
    /// - `TokenError::Store(StoreError::NotFound)` if the user doesn't exist
    /// - `TokenError::Exhausted` if no free candidate was found
    pub async fn issue(&self, user_id: Uuid) -> Result<User, TokenError> {
        for candidate in self.candidates() {
            if self.is_taken(&candidate).await? {
                continue;
            }

            match self.users.assign_token(user_id, &candidate).await {
                Ok(user) => {
                    debug!(user_id = %user.id, "Issued auth token");
                    return Ok(user);
                }
                Err(e) if e.is_conflict_on("auth_token") => {
                    warn!("Auth token was taken concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(TokenError::Exhausted {
            attempts: MAX_ATTEMPTS_PER_LENGTH * 2,
        })
    }

    /// Registers a user with a freshly issued unique token
    ///
    /// # Errors
    ///
    /// - `TokenError::Store(StoreError::Conflict { field: "email" })` if the
    ///   email is already registered
    /// - `TokenError::Exhausted` if no free candidate was found
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, TokenError> {
        for candidate in self.candidates() {
            if self.is_taken(&candidate).await? {
                continue;
            }

            let data = CreateUser {
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                auth_token: candidate,
            };

            match self.users.create_user(data).await {
                Ok(user) => {
                    debug!(user_id = %user.id, "Registered user");
                    return Ok(user);
                }
                Err(e) if e.is_conflict_on("auth_token") => {
                    warn!("Auth token was taken concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(TokenError::Exhausted {
            attempts: MAX_ATTEMPTS_PER_LENGTH * 2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of tokens, then repeats the last one
    struct Scripted {
        tokens: Mutex<VecDeque<String>>,
        lengths: Mutex<Vec<usize>>,
    }

    impl Scripted {
        fn new(tokens: &[&str]) -> Self {
            Self {
                tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
                lengths: Mutex::new(Vec::new()),
            }
        }
    }

    impl TokenGenerator for Scripted {
        fn generate(&self, length: usize) -> String {
            self.lengths.lock().unwrap().push(length);
            let mut tokens = self.tokens.lock().unwrap();
            if tokens.len() > 1 {
                tokens.pop_front().unwrap()
            } else {
                tokens.front().cloned().unwrap()
            }
        }
    }

    fn authority(generator: Arc<Scripted>, store: Arc<MemoryStore>) -> TokenAuthority {
        TokenAuthority::new(generator, store, 20)
    }

    #[tokio::test]
    async fn test_issue_skips_colliding_candidates() {
        let store = Arc::new(MemoryStore::new());
        let existing = authority(Arc::new(Scripted::new(&["t1"])), store.clone())
            .create_user("owner@example.com", "test_hash")
            .await
            .unwrap();
        assert_eq!(existing.auth_token, "t1");

        let other = authority(Arc::new(Scripted::new(&["u1"])), store.clone())
            .create_user("other@example.com", "test_hash")
            .await
            .unwrap();

        let generator = Arc::new(Scripted::new(&["t1", "t1", "t2"]));
        let issued = authority(generator.clone(), store.clone())
            .issue(other.id)
            .await
            .unwrap();

        assert_eq!(issued.auth_token, "t2");
        assert_eq!(generator.lengths.lock().unwrap().len(), 3);
        assert!(store.find_user_by_token("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_user_skips_colliding_candidates() {
        let store = Arc::new(MemoryStore::new());
        authority(Arc::new(Scripted::new(&["t1"])), store.clone())
            .create_user("first@example.com", "test_hash")
            .await
            .unwrap();

        let user = authority(Arc::new(Scripted::new(&["t1", "t1", "t2"])), store)
            .create_user("second@example.com", "test_hash")
            .await
            .unwrap();

        assert_eq!(user.auth_token, "t2");
    }

    #[tokio::test]
    async fn test_exhaustion_after_widening() {
        let store = Arc::new(MemoryStore::new());
        authority(Arc::new(Scripted::new(&["t1"])), store.clone())
            .create_user("first@example.com", "test_hash")
            .await
            .unwrap();

        let generator = Arc::new(Scripted::new(&["t1"]));
        let err = authority(generator.clone(), store)
            .create_user("second@example.com", "test_hash")
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::Exhausted { attempts: 20 }));

        let lengths = generator.lengths.lock().unwrap();
        assert_eq!(lengths.len(), 2 * MAX_ATTEMPTS_PER_LENGTH);
        assert!(lengths[..MAX_ATTEMPTS_PER_LENGTH].iter().all(|&l| l == 20));
        assert!(lengths[MAX_ATTEMPTS_PER_LENGTH..].iter().all(|&l| l == 40));
    }

    #[tokio::test]
    async fn test_create_user_reports_email_conflict() {
        let store = Arc::new(MemoryStore::new());
        authority(Arc::new(Scripted::new(&["a"])), store.clone())
            .create_user("same@example.com", "test_hash")
            .await
            .unwrap();

        let err = authority(Arc::new(Scripted::new(&["b"])), store)
            .create_user("same@example.com", "test_hash")
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::Store(ref e) if e.is_conflict_on("email")));
    }

    #[tokio::test]
    async fn test_issue_for_missing_user() {
        let store = Arc::new(MemoryStore::new());
        let err = authority(Arc::new(Scripted::new(&["a"])), store)
            .issue(Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::Store(StoreError::NotFound)));
    }
}
