use chrono::Utc;
use tracing::{debug, info};

use super::tasks::attach_subtasks;
use crate::db::Db;
use crate::error::{Error, Result};
use crate::models::{
    NewWorkspace, PublicWorkspaceView, Workspace, WorkspaceChanges, new_id, random_token, touch,
};

const DEFAULT_WORKSPACE_NAME: &str = "My Tasks";
const DEFAULT_WORKSPACE_DESCRIPTION: &str = "Default workspace for my tasks";

/// The token alone grants read access to a public workspace, so it must be
/// unguessable rather than merely unique.
pub fn generate_share_token() -> String {
    random_token()
}

#[derive(Clone)]
pub struct WorkspaceService {
    db: Db,
}

impl WorkspaceService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// New workspaces are always private but already carry a share token.
    pub async fn create(&self, owner_id: &str, input: NewWorkspace) -> Result<Workspace> {
        let now = Utc::now();
        let workspace = Workspace {
            id: new_id(),
            name: input.name,
            description: input.description,
            owner_id: owner_id.to_owned(),
            is_public: false,
            share_token: Some(generate_share_token()),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_workspace(&workspace).await?;

        info!(workspace_id = %workspace.id, owner_id, "workspace created");
        Ok(workspace)
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<Workspace>> {
        self.db.list_workspaces(owner_id).await
    }

    pub async fn get(&self, owner_id: &str, workspace_id: &str) -> Result<Workspace> {
        self.db
            .find_workspace(owner_id, workspace_id)
            .await?
            .ok_or(Error::NotFound("Workspace"))
    }

    /// The owner's oldest workspace, creating "My Tasks" if they have none.
    pub async fn get_or_create_default(&self, owner_id: &str) -> Result<Workspace> {
        if let Some(existing) = self.db.list_workspaces(owner_id).await?.into_iter().next() {
            return Ok(existing);
        }
        self.create(
            owner_id,
            NewWorkspace {
                name: DEFAULT_WORKSPACE_NAME.to_owned(),
                description: Some(DEFAULT_WORKSPACE_DESCRIPTION.to_owned()),
            },
        )
        .await
    }

    pub async fn update(
        &self,
        owner_id: &str,
        workspace_id: &str,
        changes: WorkspaceChanges,
    ) -> Result<Workspace> {
        let existing = self.get(owner_id, workspace_id).await?;
        let updated = self
            .db
            .update_workspace(owner_id, workspace_id, &changes, touch(existing.updated_at))
            .await?;
        if !updated {
            return Err(Error::NotFound("Workspace"));
        }

        info!(workspace_id, owner_id, "workspace updated");
        self.get(owner_id, workspace_id).await
    }

    /// Replaces the share token; links built on the old one stop resolving.
    pub async fn generate_share_token(&self, owner_id: &str, workspace_id: &str) -> Result<String> {
        let existing = self.get(owner_id, workspace_id).await?;
        let token = generate_share_token();
        let updated = self
            .db
            .set_share_token(owner_id, workspace_id, &token, touch(existing.updated_at))
            .await?;
        if !updated {
            return Err(Error::NotFound("Workspace"));
        }

        info!(workspace_id, owner_id, "share token regenerated");
        Ok(token)
    }

    pub async fn toggle_public(&self, owner_id: &str, workspace_id: &str) -> Result<bool> {
        let existing = self.get(owner_id, workspace_id).await?;
        let is_public = self
            .db
            .toggle_workspace_public(owner_id, workspace_id, touch(existing.updated_at))
            .await?
            .ok_or(Error::NotFound("Workspace"))?;

        info!(workspace_id, owner_id, is_public, "workspace visibility changed");
        Ok(is_public)
    }

    /// Returns whether a workspace was removed; its tasks go with it.
    pub async fn delete(&self, owner_id: &str, workspace_id: &str) -> Result<bool> {
        let deleted = self.db.delete_workspace(owner_id, workspace_id).await?;
        if deleted {
            info!(workspace_id, owner_id, "workspace deleted");
        }
        Ok(deleted)
    }

    /// The anonymous read path. Unknown token and private workspace are the
    /// same error.
    pub async fn public_view(&self, share_token: &str) -> Result<PublicWorkspaceView> {
        let workspace = match self.db.find_workspace_by_share_token(share_token).await? {
            Some(workspace) if workspace.is_public => workspace,
            _ => {
                debug!("share token rejected");
                return Err(Error::ShareAccess);
            }
        };

        let tasks = self.db.list_tasks_in_workspace(&workspace.id).await?;
        let tasks = attach_subtasks(&self.db, tasks).await?;
        Ok(PublicWorkspaceView { workspace, tasks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_tokens_are_hex_and_distinct() {
        let a = generate_share_token();
        let b = generate_share_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
