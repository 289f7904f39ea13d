/// Session endpoints
///
/// Logging in rotates the auth token, so every login invalidates the token
/// handed out before. Logging out rotates it again without revealing the
/// new value, which leaves the client with nothing that still works.
///
/// ```json
/// { "session": { "email": "ada@example.com", "password": "secret123" } }
/// ```

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use taskmanager_shared::auth::password::verify_password;
use tracing::{debug, info};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::version::ApiVersion,
    presenter::{self, TokenVisibility},
};

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct SessionParams {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionPayload {
    pub session: SessionParams,
}

/// `POST /sessions`
///
/// Returns the user with a new auth token, or 401 for an unknown email or
/// wrong password (the two cases are indistinguishable to the client).
pub async fn create_session(
    State(state): State<AppState>,
    version: ApiVersion,
    payload: Result<Json<SessionPayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(SessionPayload { session }) = payload?;

    let Some(user) = state.users.find_user_by_email(&session.email).await? else {
        debug!("Login attempt for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&session.password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let user = state.authority.issue(user.id).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(presenter::user(version, &user, TokenVisibility::Owner)))
}

/// `DELETE /sessions/:token`
///
/// 404 when no user holds the token.
pub async fn destroy_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    let user = state
        .users
        .find_user_by_token(&token)
        .await?
        .ok_or(ApiError::NotFound)?;

    state.authority.issue(user.id).await?;
    info!(user_id = %user.id, "User logged out");

    Ok(StatusCode::NO_CONTENT)
}
