use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use taskboard_core::validation::{CreateWorkspaceInput, UpdateWorkspaceInput};
use taskboard_core::{Error, PublicWorkspaceView, Workspace, validate};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, JsonBody};
use crate::response::{Deleted, Envelope, created, deleted, ok};

#[derive(Debug, Serialize)]
pub struct ShareToken {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    pub is_public: bool,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Envelope<Vec<Workspace>>>> {
    let workspaces = state.workspaces.list(&user.id).await?;
    Ok(ok(workspaces))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Workspace>>> {
    let workspace = state.workspaces.get(&user.id, &id).await?;
    Ok(ok(workspace))
}

pub async fn default(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Envelope<Workspace>>> {
    let workspace = state.workspaces.get_or_create_default(&user.id).await?;
    Ok(ok(workspace))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(input): JsonBody<CreateWorkspaceInput>,
) -> ApiResult<(StatusCode, Json<Envelope<Workspace>>)> {
    let input = validate(input)?;
    let workspace = state.workspaces.create(&user.id, input).await?;
    Ok(created(workspace))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateWorkspaceInput>,
) -> ApiResult<Json<Envelope<Workspace>>> {
    let changes = validate(input)?;
    let workspace = state.workspaces.update(&user.id, &id, changes).await?;
    Ok(ok(workspace))
}

pub async fn regenerate_share_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<ShareToken>>> {
    let token = state.workspaces.generate_share_token(&user.id, &id).await?;
    Ok(ok(ShareToken { token }))
}

pub async fn toggle_public(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Visibility>>> {
    let is_public = state.workspaces.toggle_public(&user.id, &id).await?;
    Ok(ok(Visibility { is_public }))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    if !state.workspaces.delete(&user.id, &id).await? {
        return Err(Error::NotFound("Workspace").into());
    }
    Ok(deleted("Workspace"))
}

/// Unauthenticated.
pub async fn public_view(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<Envelope<PublicWorkspaceView>>> {
    let view = state.workspaces.public_view(&token).await?;
    Ok(ok(view))
}
