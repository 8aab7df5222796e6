use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use taskboard_core::validation::{CreateTaskInput, TaskListQuery, UpdateTaskInput};
use taskboard_core::{Error, Task, validate};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, JsonBody, QueryParams};
use crate::response::{Deleted, Envelope, created, deleted, ok};

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<TaskListQuery>,
) -> ApiResult<Json<Envelope<Vec<Task>>>> {
    let filters = validate(query)?;
    let tasks = state.tasks.list(&user.id, &filters).await?;
    Ok(ok(tasks))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Task>>> {
    let task = state.tasks.get(&user.id, &id).await?;
    Ok(ok(task))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(input): JsonBody<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<Envelope<Task>>)> {
    let input = validate(input)?;
    let task = state.tasks.create(&user.id, input).await?;
    Ok(created(task))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateTaskInput>,
) -> ApiResult<Json<Envelope<Task>>> {
    let changes = validate(input)?;
    let task = state.tasks.update(&user.id, &id, changes).await?;
    Ok(ok(task))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    if !state.tasks.delete(&user.id, &id).await? {
        return Err(Error::NotFound("Task").into());
    }
    Ok(deleted("Task"))
}
