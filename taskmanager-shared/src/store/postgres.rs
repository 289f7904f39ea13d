/// PostgreSQL store
///
/// Thin adapter from the store traits to the sqlx queries in
/// [`crate::models`]. Uniqueness is enforced by the `users_email_key` and
/// `users_auth_token_key` constraints.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::query::TaskQuery;

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_auth_token(&self.pool, token).await?)
    }

    async fn token_exists(&self, token: &str) -> Result<bool, StoreError> {
        Ok(User::auth_token_exists(&self.pool, token).await?)
    }

    async fn assign_token(&self, id: Uuid, token: &str) -> Result<User, StoreError> {
        User::set_auth_token(&self.pool, id, token)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<User, StoreError> {
        User::update(&self.pool, id, data)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, owner: Uuid, data: NewTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, owner, data).await?)
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_for_owner(&self.pool, owner, id).await?)
    }

    async fn list_tasks(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_for_owner(&self.pool, owner, query).await?)
    }

    async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, owner, id, changes).await?)
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, owner, id).await?)
    }
}
