/// Authentication
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: random auth token generation
/// - [`authority`]: unique token assignment with collision retry
/// - [`middleware`]: resolving the Authorization header to an [`middleware::Identity`]
///
/// # Example
///
/// ```
/// use taskmanager_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod authority;
pub mod middleware;
pub mod password;
pub mod token;
