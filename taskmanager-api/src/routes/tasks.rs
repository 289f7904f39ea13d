/// Task endpoints
///
/// All routes require authentication and only ever touch the caller's own
/// tasks. Payloads are wrapped in a `task` key:
///
/// ```json
/// { "task": { "title": "Buy a new notebook", "description": "Squared paper", "done": false } }
/// ```
///
/// v2 list requests accept a filter and a sort:
///
/// ```text
/// GET /tasks?q[title_cont]=note&q[s]=title+ASC
/// ```

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use taskmanager_shared::{
    auth::middleware::Identity,
    models::task::TaskParams,
    query::{TaskQuery, TaskQueryParams},
};
use uuid::Uuid;

use crate::{app::AppState, error::ApiResult, middleware::version::ApiVersion, presenter};

/// Request body for create and update
#[derive(Debug, Deserialize)]
pub struct TaskPayload {
    pub task: TaskParams,
}

/// `GET /tasks`
///
/// Filtering and sorting only apply to v2; v1 always lists every task in
/// creation order.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    version: ApiVersion,
    params: Result<Query<TaskQueryParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let query = match version {
        ApiVersion::V1 => TaskQuery::all(),
        ApiVersion::V2 => {
            let Query(params) = params?;
            TaskQuery::from_params(&params)
        }
    };

    let tasks = state.tasks.list(&identity, &query).await?;

    Ok(Json(presenter::tasks(version, &tasks)))
}

/// `GET /tasks/:id`
pub async fn show_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    version: ApiVersion,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let task = state.tasks.show(&identity, id).await?;

    Ok(Json(presenter::task(version, &task)))
}

/// `POST /tasks`
///
/// The owner always comes from the identity; a `user_id` in the body is
/// ignored.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    version: ApiVersion,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(payload) = payload?;
    let task = state.tasks.create(&identity, payload.task).await?;

    Ok((StatusCode::CREATED, Json(presenter::task(version, &task))))
}

/// `PUT /tasks/:id` and `PATCH /tasks/:id`
///
/// Only supplied attributes change; `null` clears `description` or
/// `deadline`.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    version: ApiVersion,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let task = state.tasks.update(&identity, id, payload.task).await?;

    Ok(Json(presenter::task(version, &task)))
}

/// `DELETE /tasks/:id`
pub async fn destroy_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.tasks.destroy(&identity, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
