/// Owner-scoped task operations
///
/// [`TaskAccessor`] is the only way handlers reach tasks. Every operation
/// takes the caller's [`Identity`] explicitly and passes its user ID to the
/// store, so a task that belongs to someone else behaves exactly like one
/// that doesn't exist.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskmanager_shared::accessor::TaskAccessor;
/// use taskmanager_shared::auth::middleware::Identity;
/// use taskmanager_shared::models::task::TaskParams;
/// use taskmanager_shared::query::TaskQuery;
/// use taskmanager_shared::store::MemoryStore;
///
/// # async fn example(identity: Identity) -> Result<(), Box<dyn std::error::Error>> {
/// let accessor = TaskAccessor::new(Arc::new(MemoryStore::new()));
///
/// let params = TaskParams {
///     title: Some("Buy a new notebook".to_string()),
///     ..Default::default()
/// };
/// let task = accessor.create(&identity, params).await?;
/// let tasks = accessor.list(&identity, &TaskQuery::all()).await?;
/// assert_eq!(tasks[0].id, task.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::auth::middleware::Identity;
use crate::models::task::{Task, TaskParams};
use crate::query::TaskQuery;
use crate::store::{StoreError, TaskStore};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Task doesn't exist or isn't owned by the caller
    #[error("task not found")]
    NotFound,

    /// Payload failed validation; nothing was written
    #[error("invalid task: {0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AccessError::NotFound,
            other => AccessError::Store(other),
        }
    }
}

/// Task CRUD scoped to the authenticated user
#[derive(Clone)]
pub struct TaskAccessor {
    tasks: Arc<dyn TaskStore>,
}

impl TaskAccessor {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    /// The caller's tasks, filtered and sorted by `query`
    pub async fn list(
        &self,
        identity: &Identity,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, AccessError> {
        let tasks = self.tasks.list_tasks(identity.user_id(), query).await?;
        debug!(user_id = %identity.user_id(), count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    pub async fn show(&self, identity: &Identity, id: Uuid) -> Result<Task, AccessError> {
        self.tasks
            .find_task(identity.user_id(), id)
            .await?
            .ok_or(AccessError::NotFound)
    }

    /// Creates a task owned by the caller
    ///
    /// # Errors
    ///
    /// `AccessError::Invalid` when the title is missing or blank
    pub async fn create(
        &self,
        identity: &Identity,
        params: TaskParams,
    ) -> Result<Task, AccessError> {
        let data = params.into_new_task().map_err(AccessError::Invalid)?;
        let task = self.tasks.create_task(identity.user_id(), data).await?;

        debug!(user_id = %identity.user_id(), task_id = %task.id, "Created task");
        Ok(task)
    }

    /// Applies the supplied fields to one of the caller's tasks
    pub async fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        params: TaskParams,
    ) -> Result<Task, AccessError> {
        let changes = params.into_changes().map_err(AccessError::Invalid)?;

        self.tasks
            .update_task(identity.user_id(), id, changes)
            .await?
            .ok_or(AccessError::NotFound)
    }

    pub async fn destroy(&self, identity: &Identity, id: Uuid) -> Result<(), AccessError> {
        if self.tasks.delete_task(identity.user_id(), id).await? {
            debug!(user_id = %identity.user_id(), task_id = %id, "Deleted task");
            Ok(())
        } else {
            Err(AccessError::NotFound)
        }
    }
}
