/// Persistence interfaces
///
/// The rest of the system only talks to storage through [`UserStore`] and
/// [`TaskStore`]. Two implementations are provided:
///
/// - [`PgStore`]: PostgreSQL via sqlx, used in production
/// - [`MemoryStore`]: in-process, used by tests and local runs without a database
///
/// Both enforce uniqueness of `users.email` and `users.auth_token` at write
/// time and report violations as [`StoreError::Conflict`]. Application-level
/// existence checks are an optimisation; these write-time checks are what
/// keep tokens unique under concurrent issuance.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskmanager_shared::store::{MemoryStore, TaskStore, UserStore};
///
/// let store = Arc::new(MemoryStore::new());
/// let users: Arc<dyn UserStore> = store.clone();
/// let tasks: Arc<dyn TaskStore> = store;
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::query::TaskQuery;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The targeted record does not exist
    #[error("record not found")]
    NotFound,

    /// A unique constraint was violated; `field` names the attribute
    #[error("{field} has already been taken")]
    Conflict { field: String },

    /// Any other database failure
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Whether this is a uniqueness violation on `field`
    pub fn is_conflict_on(&self, field: &str) -> bool {
        matches!(self, StoreError::Conflict { field: f } if f == field)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let field = db_err
                    .constraint()
                    .map(constraint_field)
                    .unwrap_or("unknown")
                    .to_string();
                StoreError::Conflict { field }
            }
            other => StoreError::Database(other),
        }
    }
}

/// Maps a unique constraint name to the attribute it protects
fn constraint_field(constraint: &str) -> &str {
    match constraint {
        "users_email_key" => "email",
        "users_auth_token_key" => "auth_token",
        other => other,
    }
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; `Conflict` on duplicate email or token
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Exact-match token lookup
    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn token_exists(&self, token: &str) -> Result<bool, StoreError>;

    /// Replaces the user's token; `NotFound` if the user is gone, `Conflict`
    /// if another user holds it
    async fn assign_token(&self, id: Uuid, token: &str) -> Result<User, StoreError>;

    /// Partial update; `NotFound` if the user is gone
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<User, StoreError>;

    /// Deletes the user and their tasks
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Verifies the backing storage is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Task persistence, always scoped by owner
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, owner: Uuid, data: NewTask) -> Result<Task, StoreError>;

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Filtered and sorted list; creation order when `query` has no sort
    async fn list_tasks(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;

    async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;
}
