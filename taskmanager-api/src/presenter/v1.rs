/// Flat v1 representations

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskmanager_shared::models::{task::Task, user::User};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct TaskView<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub done: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub short_description: String,
}

impl<'a> From<&'a Task> for TaskView<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id,
            title: &task.title,
            description: task.description.as_deref(),
            done: task.done,
            deadline: task.deadline,
            created_at: task.created_at,
            updated_at: task.updated_at,
            user_id: task.user_id,
            short_description: task.short_description(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView<'a> {
    pub id: Uuid,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> UserView<'a> {
    pub fn new(user: &'a User, auth_token: Option<&'a str>) -> Self {
        Self {
            id: user.id,
            email: &user.email,
            auth_token,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
