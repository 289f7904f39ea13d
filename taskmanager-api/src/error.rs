/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`. Error bodies use a single
/// `errors` key and are the same for every API version.
///
/// # Example
///
/// ```
/// use taskmanager_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound);
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskmanager_shared::{
    accessor::AccessError,
    auth::{authority::TokenError, middleware::AuthError, password::PasswordError},
    store::StoreError,
    validation::{error_map, field_error, ErrorMap},
};
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Missing or unknown auth token (401)
    Unauthenticated,

    /// Wrong email or password on login (401)
    InvalidCredentials,

    /// Record absent or not visible to the caller (404, empty body)
    NotFound,

    /// Field validation failed (422)
    Validation(ErrorMap),

    /// Malformed request (400)
    BadRequest(String),

    /// Internal server error (500); the message is logged, never returned
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated => write!(f, "Not authenticated"),
            ApiError::InvalidCredentials => write!(f, "Invalid email or password"),
            ApiError::NotFound => write!(f, "Not found"),
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} fields", errors.len())
            }
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "errors": "Not authenticated" })),
            )
                .into_response(),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "errors": "Invalid email or password" })),
            )
                .into_response(),
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": msg }))).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "errors": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Validation(error_map(&err))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Conflict { field } if field == "email" => {
                ApiError::Validation(field_error("email", "has already been taken"))
            }
            other => ApiError::Internal(format!("Store error: {}", other)),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound => ApiError::NotFound,
            AccessError::Invalid(errors) => errors.into(),
            AccessError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::InvalidToken => ApiError::Unauthenticated,
            AuthError::Store(e) => {
                ApiError::Internal(format!("Authentication lookup failed: {}", e))
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Store(e) => e.into(),
            exhausted => ApiError::Internal(exhausted.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// Unparseable IDs can't match any record
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ApiError::Unauthenticated.to_string(), "Not authenticated");
        assert_eq!(
            ApiError::BadRequest("Invalid input".to_string()).to_string(),
            "Bad request: Invalid input"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation(field_error("title", "can't be blank"))
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_email_conflict_is_validation_error() {
        let err: ApiError = StoreError::Conflict {
            field: "email".to_string(),
        }
        .into();

        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors["email"], vec!["has already been taken"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_conflict_is_internal() {
        let err: ApiError = TokenError::Exhausted { attempts: 20 }.into();
        assert!(matches!(err, ApiError::Internal(_)));

        let err: ApiError = StoreError::Conflict {
            field: "auth_token".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
