/// JSON:API-style v2 representations
///
/// Every resource is `{"id", "type", "attributes"}` with hyphenated
/// attribute names. The ID only appears at the top level.

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskmanager_shared::models::{task::Task, user::User};
use uuid::Uuid;

/// A single resource object
#[derive(Debug, Serialize)]
pub struct Resource<A> {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: A,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskAttributes<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub done: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub short_description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAttributes<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn task_resource(task: &Task) -> Resource<TaskAttributes<'_>> {
    Resource {
        id: task.id,
        kind: "tasks",
        attributes: TaskAttributes {
            title: &task.title,
            description: task.description.as_deref(),
            done: task.done,
            deadline: task.deadline,
            created_at: task.created_at,
            updated_at: task.updated_at,
            user_id: task.user_id,
            short_description: task.short_description(),
        },
    }
}

pub fn user_resource<'a>(
    user: &'a User,
    auth_token: Option<&'a str>,
) -> Resource<UserAttributes<'a>> {
    Resource {
        id: user.id,
        kind: "users",
        attributes: UserAttributes {
            email: &user.email,
            auth_token,
            created_at: user.created_at,
            updated_at: user.updated_at,
        },
    }
}
