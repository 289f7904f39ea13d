/// Auth token generation
///
/// Tokens are opaque base62 strings (`[A-Za-z0-9]`). At the default length
/// of 20 characters the key space is 62^20 (about 2^119), so collisions are
/// practically impossible but still handled by
/// [`crate::auth::authority::TokenAuthority`].
///
/// The generator is a trait so tests can script the exact sequence of
/// candidates and force collisions.
///
/// # Example
///
/// ```
/// use taskmanager_shared::auth::token::{RandomTokenGenerator, TokenGenerator};
///
/// let token = RandomTokenGenerator.generate(20);
/// assert_eq!(token.len(), 20);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```

use rand::{distributions::Alphanumeric, Rng};

/// Default token length in characters
pub const DEFAULT_TOKEN_LENGTH: usize = 20;

/// Shortest token length accepted by configuration
pub const MIN_TOKEN_LENGTH: usize = 16;

/// Longest token length accepted by configuration
///
/// The doubled fallback length must still fit `users.auth_token VARCHAR(255)`.
pub const MAX_TOKEN_LENGTH: usize = 127;

/// Source of candidate tokens
pub trait TokenGenerator: Send + Sync {
    /// Returns a fresh candidate of `length` characters
    fn generate(&self, length: usize) -> String;
}

/// Cryptographically random base62 tokens from the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self, length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}
