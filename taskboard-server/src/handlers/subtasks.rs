use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use taskboard_core::validation::{CreateSubtaskInput, SubtaskListQuery, UpdateSubtaskInput};
use taskboard_core::{Error, Subtask, validate};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, JsonBody, QueryParams};
use crate::response::{Deleted, Envelope, created, deleted, ok};

pub async fn list_for_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Envelope<Vec<Subtask>>>> {
    let subtasks = state.subtasks.list_for_task(&user.id, &task_id).await?;
    Ok(ok(subtasks))
}

/// `GET /api/subtasks?taskId=...`
pub async fn list_by_query(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<SubtaskListQuery>,
) -> ApiResult<Json<Envelope<Vec<Subtask>>>> {
    let task_id = validate(query)?;
    let subtasks = state.subtasks.list_for_task(&user.id, &task_id).await?;
    Ok(ok(subtasks))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(input): JsonBody<CreateSubtaskInput>,
) -> ApiResult<(StatusCode, Json<Envelope<Subtask>>)> {
    let input = validate(input)?;
    let subtask = state.subtasks.create(&user.id, input).await?;
    Ok(created(subtask))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateSubtaskInput>,
) -> ApiResult<Json<Envelope<Subtask>>> {
    let changes = validate(input)?;
    let subtask = state.subtasks.update(&user.id, &id, changes).await?;
    Ok(ok(subtask))
}

pub async fn toggle(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Subtask>>> {
    let subtask = state.subtasks.toggle(&user.id, &id).await?;
    Ok(ok(subtask))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    if !state.subtasks.delete(&user.id, &id).await? {
        return Err(Error::NotFound("Subtask").into());
    }
    Ok(deleted("Subtask"))
}
