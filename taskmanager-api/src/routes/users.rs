/// User endpoints
///
/// Registration is public. Every other route requires authentication, and
/// update/delete only act on the caller's own account: a path ID that
/// isn't the caller's is answered with 404.
///
/// ```json
/// {
///   "user": {
///     "email": "ada@example.com",
///     "password": "secret123",
///     "password_confirmation": "secret123"
///   }
/// }
/// ```

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use taskmanager_shared::{
    auth::{middleware::Identity, password::hash_password},
    models::user::{UpdateUser, UserParams},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::version::ApiVersion,
    presenter::{self, TokenVisibility},
};

/// Request body for registration and update
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub user: UserParams,
}

/// `GET /users/:id`
///
/// The auth token is only included when the caller looks up themselves.
pub async fn show_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    version: ApiVersion,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let user = state.users.find_user(id).await?.ok_or(ApiError::NotFound)?;

    let visibility = if user.id == identity.user_id() {
        TokenVisibility::Owner
    } else {
        TokenVisibility::Hidden
    };

    Ok(Json(presenter::user(version, &user, visibility)))
}

/// `POST /users`
///
/// Creates the account with a freshly issued auth token and returns it.
pub async fn create_user(
    State(state): State<AppState>,
    version: ApiVersion,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(UserPayload { user: params }) = payload?;
    params.check_create()?;

    let email = params.email.unwrap_or_default();
    let password_hash = hash_password(&params.password.unwrap_or_default())?;

    let user = state.authority.create_user(&email, &password_hash).await?;
    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(presenter::user(version, &user, TokenVisibility::Owner)),
    ))
}

/// `PUT /users/:id` and `PATCH /users/:id`
pub async fn update_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    version: ApiVersion,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    if id != identity.user_id() {
        return Err(ApiError::NotFound);
    }

    let Json(UserPayload { user: params }) = payload?;
    params.check_update()?;

    let password_hash = match params.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let changes = UpdateUser {
        email: params.email,
        password_hash,
    };

    let user = if changes.is_empty() {
        identity.user
    } else {
        state.users.update_user(id, changes).await?
    };

    Ok(Json(presenter::user(version, &user, TokenVisibility::Owner)))
}

/// `DELETE /users/:id`
///
/// Removes the account and all of its tasks.
pub async fn destroy_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if id != identity.user_id() {
        return Err(ApiError::NotFound);
    }

    if !state.users.delete_user(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = %id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
