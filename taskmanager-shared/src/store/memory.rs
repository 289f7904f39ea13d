/// In-process store
///
/// Keeps users and tasks in insertion order behind a single `RwLock`.
/// Uniqueness checks and writes happen under the same write guard, so the
/// constraints hold under concurrent requests just like the database ones.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{normalize_email, CreateUser, UpdateUser, User};
use crate::query::TaskQuery;

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    tasks: Vec<Task>,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn token_taken(&self, token: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.auth_token == token && Some(u.id) != except)
    }

    fn user_mut(&mut self, id: Uuid) -> Result<&mut User, StoreError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)
    }
}

/// Store holding everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(field: &str) -> StoreError {
    StoreError::Conflict {
        field: field.to_string(),
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let email = normalize_email(&data.email);

        if state.email_taken(&email, None) {
            return Err(conflict("email"));
        }
        if state.token_taken(&data.auth_token, None) {
            return Err(conflict("auth_token"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: data.password_hash,
            auth_token: data.auth_token,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.auth_token == token).cloned())
    }

    async fn token_exists(&self, token: &str) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        Ok(state.token_taken(token, None))
    }

    async fn assign_token(&self, id: Uuid, token: &str) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.token_taken(token, Some(id)) {
            return Err(conflict("auth_token"));
        }

        let user = state.user_mut(id)?;
        user.auth_token = token.to_string();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        let email = data.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if state.email_taken(email, Some(id)) {
                return Err(conflict("email"));
            }
        }

        let user = state.user_mut(id)?;
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;

        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        let deleted = state.users.len() < before;

        if deleted {
            state.tasks.retain(|t| t.user_id != id);
        }

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, owner: Uuid, data: NewTask) -> Result<Task, StoreError> {
        let mut state = self.state.write().await;

        if !state.users.iter().any(|u| u.id == owner) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: owner,
            title: data.title,
            description: data.description,
            done: data.done,
            deadline: data.deadline,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(task.clone());

        Ok(task)
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .find(|t| t.id == id && t.user_id == owner)
            .cloned())
    }

    async fn list_tasks(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let owned: Vec<Task> = {
            let state = self.state.read().await;
            state
                .tasks
                .iter()
                .filter(|t| t.user_id == owner)
                .cloned()
                .collect()
        };

        Ok(query.apply(owned))
    }

    async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        let mut state = self.state.write().await;

        let Some(task) = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner)
        else {
            return Ok(None);
        };

        changes.apply_to(task);
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;

        let before = state.tasks.len();
        state.tasks.retain(|t| !(t.id == id && t.user_id == owner));

        Ok(state.tasks.len() < before)
    }
}
