/// Response rendering
///
/// Handlers load domain values once and hand them to these functions with
/// the negotiated [`ApiVersion`]; [`v1`] and [`v2`] only differ in shape.
/// Error bodies are not rendered here, see [`crate::error::ApiError`].

use serde_json::{json, Value};
use taskmanager_shared::models::{task::Task, user::User};

use crate::middleware::version::ApiVersion;

pub mod v1;
pub mod v2;

/// Whether a user document may include the auth token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVisibility {
    /// The caller is this user (self lookup, registration, login)
    Owner,
    /// Anyone else
    Hidden,
}

pub fn task(version: ApiVersion, task: &Task) -> Value {
    match version {
        ApiVersion::V1 => json!(v1::TaskView::from(task)),
        ApiVersion::V2 => json!({ "data": v2::task_resource(task) }),
    }
}

pub fn tasks(version: ApiVersion, tasks: &[Task]) -> Value {
    match version {
        ApiVersion::V1 => {
            let views: Vec<v1::TaskView<'_>> = tasks.iter().map(v1::TaskView::from).collect();
            json!({ "tasks": views })
        }
        ApiVersion::V2 => {
            let resources: Vec<_> = tasks.iter().map(v2::task_resource).collect();
            json!({ "data": resources })
        }
    }
}

pub fn user(version: ApiVersion, user: &User, visibility: TokenVisibility) -> Value {
    let token = match visibility {
        TokenVisibility::Owner => Some(user.auth_token.as_str()),
        TokenVisibility::Hidden => None,
    };

    match version {
        ApiVersion::V1 => json!(v1::UserView::new(user, token)),
        ApiVersion::V2 => json!({ "data": v2::user_resource(user, token) }),
    }
}
