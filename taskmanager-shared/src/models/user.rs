/// User model and database operations
///
/// This module provides the User model and the PostgreSQL queries behind the
/// user half of [`crate::store::PgStore`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     auth_token VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email),
///     CONSTRAINT users_auth_token_key UNIQUE (auth_token)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskmanager_shared::models::user::{User, CreateUser};
/// use taskmanager_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     auth_token: "x1Yq8pWm3nZ0aBcDeFgH".to_string(),
/// }).await?;
///
/// let found = User::find_by_auth_token(&pool, &user.auth_token).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The
/// `auth_token` is unique across all users and identifies the user on every
/// authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, stored lower-cased
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Opaque credential sent in the `Authorization` header
    pub auth_token: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// The token is assigned by [`crate::auth::authority::TokenAuthority`], never
/// taken from client input.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address (normalized by [`normalize_email`] before insert)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Freshly issued auth token
    pub auth_token: String,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New email address
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,
}

impl UpdateUser {
    /// Returns true when no field would change
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none()
    }
}

/// Lower-cases and trims an email address so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account attributes as sent by clients inside `{"user": {...}}`
///
/// Every field is optional at the parsing stage; [`UserParams::check_create`]
/// decides which ones registration requires.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserParams {
    #[serde(default)]
    #[validate(
        email(message = "is invalid"),
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(
        length(min = 6, message = "is too short (minimum is 6 characters)"),
        custom(function = "password_within_max")
    )]
    pub password: Option<String>,

    #[serde(default)]
    pub password_confirmation: Option<String>,
}

impl UserParams {
    /// Validates a registration payload
    ///
    /// # Errors
    ///
    /// Returns field errors when email or password is missing or malformed,
    /// or when the confirmation doesn't match.
    pub fn check_create(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if self.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
            errors.add("email", blank());
        }
        if self.password.as_deref().map_or(true, str::is_empty) {
            errors.add("password", blank());
        }
        self.check_confirmation(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates a partial update; absent fields are left alone
    pub fn check_update(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        self.check_confirmation(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_confirmation(&self, errors: &mut ValidationErrors) {
        if let (Some(password), Some(confirmation)) = (&self.password, &self.password_confirmation)
        {
            if password != confirmation {
                let mut error = ValidationError::new("confirmation");
                error.message = Some(Cow::Borrowed("doesn't match Password"));
                errors.add("password_confirmation", error);
            }
        }
    }
}

fn password_within_max(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() > 128 {
        let mut error = ValidationError::new("length");
        error.message = Some(Cow::Borrowed("is too long (maximum is 128 characters)"));
        return Err(error);
    }
    Ok(())
}

fn blank() -> ValidationError {
    let mut error = ValidationError::new("blank");
    error.message = Some(Cow::Borrowed("can't be blank"));
    error
}

const USER_COLUMNS: &str = "id, email, password_hash, auth_token, created_at, updated_at";

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns a database error if the email or auth token violates its
    /// unique constraint (`users_email_key` / `users_auth_token_key`).
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, auth_token) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.auth_token)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Finds the user holding exactly this auth token
    pub async fn find_by_auth_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE auth_token = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Checks whether any user currently holds this auth token
    pub async fn auth_token_exists(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE auth_token = $1)")
            .bind(token)
            .fetch_one(pool)
            .await
    }

    /// Replaces the user's auth token, revoking the previous one
    ///
    /// # Returns
    ///
    /// The updated user, or None if the user doesn't exist
    pub async fn set_auth_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET auth_token = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only `Some` fields in `data` are written; `updated_at` is always
    /// refreshed.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if user doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user by ID
    ///
    /// The user's tasks are removed with it (`ON DELETE CASCADE`).
    ///
    /// # Returns
    ///
    /// True if user was deleted, false if user didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.is_empty());

        let update = UpdateUser {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            auth_token: "token".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["auth_token"], "token");
    }

    fn params(
        email: Option<&str>,
        password: Option<&str>,
        confirmation: Option<&str>,
    ) -> UserParams {
        UserParams {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            password_confirmation: confirmation.map(str::to_string),
        }
    }

    #[test]
    fn test_check_create_accepts_valid_params() {
        let p = params(Some("new@example.com"), Some("secret123"), Some("secret123"));
        assert!(p.check_create().is_ok());

        let p = params(Some("new@example.com"), Some("secret123"), None);
        assert!(p.check_create().is_ok());
    }

    #[test]
    fn test_check_create_requires_email_and_password() {
        let errors = params(None, None, None).check_create().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_check_create_rejects_bad_email_and_short_password() {
        let errors = params(Some("not-an-email"), Some("abc"), None)
            .check_create()
            .unwrap_err();
        let fields = errors.field_errors();

        assert_eq!(fields["email"][0].message.as_deref(), Some("is invalid"));
        assert_eq!(
            fields["password"][0].message.as_deref(),
            Some("is too short (minimum is 6 characters)")
        );
    }

    fn messages<'a>(errors: &'a ValidationErrors, field: &str) -> Vec<&'a str> {
        let field_errors: &'a Vec<ValidationError> = errors.field_errors()[field];
        field_errors
            .iter()
            .filter_map(|e| e.message.as_deref())
            .collect()
    }

    #[test]
    fn test_check_create_rejects_overlong_email() {
        let labels = format!("{}.", "a".repeat(60)).repeat(4);
        let email = format!("ada@{}example.com", labels);
        assert!(email.len() > 255);

        let errors = params(Some(&email), Some("secret123"), None)
            .check_create()
            .unwrap_err();

        assert!(messages(&errors, "email").contains(&"is too long (maximum is 255 characters)"));
        assert!(!errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_password_length_bounds_have_distinct_messages() {
        let long = "x".repeat(129);
        let errors = params(None, Some(&long), None).check_update().unwrap_err();
        assert_eq!(
            messages(&errors, "password"),
            vec!["is too long (maximum is 128 characters)"]
        );

        let errors = params(None, Some("abc"), None).check_update().unwrap_err();
        assert_eq!(
            messages(&errors, "password"),
            vec!["is too short (minimum is 6 characters)"]
        );

        assert!(params(None, Some(&"x".repeat(128)), None).check_update().is_ok());
    }

    #[test]
    fn test_check_update_confirmation_mismatch() {
        let errors = params(None, Some("secret123"), Some("secret999"))
            .check_update()
            .unwrap_err();
        let fields = errors.field_errors();

        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields["password_confirmation"][0].message.as_deref(),
            Some("doesn't match Password")
        );
    }

    #[test]
    fn test_check_update_allows_empty_payload() {
        assert!(UserParams::default().check_update().is_ok());
    }
}
