use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use super::Db;
use crate::error::Result;
use crate::models::{Workspace, WorkspaceChanges};

const WORKSPACE_COLUMNS: &str =
    "id, name, description, owner_id, is_public, share_token, created_at, updated_at";

impl Db {
    pub async fn insert_workspace(&self, workspace: &Workspace) -> Result<()> {
        sqlx::query(
            "INSERT INTO workspaces (id, name, description, owner_id, is_public, share_token,
                                     created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&workspace.id)
        .bind(&workspace.name)
        .bind(&workspace.description)
        .bind(&workspace.owner_id)
        .bind(workspace.is_public)
        .bind(&workspace.share_token)
        .bind(workspace.created_at)
        .bind(workspace.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Oldest first, so the first entry is the owner's default workspace.
    pub async fn list_workspaces(&self, owner_id: &str) -> Result<Vec<Workspace>> {
        let rows = sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE owner_id = ? ORDER BY created_at, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_workspace(
        &self,
        owner_id: &str,
        workspace_id: &str,
    ) -> Result<Option<Workspace>> {
        let row = sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = ? AND owner_id = ?"
        ))
        .bind(workspace_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_workspace_by_share_token(&self, token: &str) -> Result<Option<Workspace>> {
        let row = sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE share_token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_workspace(
        &self,
        owner_id: &str,
        workspace_id: &str,
        changes: &WorkspaceChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE workspaces SET updated_at = ");
        query.push_bind(updated_at);

        if let Some(name) = &changes.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(description) = &changes.description {
            query.push(", description = ").push_bind(description.clone());
        }
        if let Some(is_public) = changes.is_public {
            query.push(", is_public = ").push_bind(is_public);
        }

        query
            .push(" WHERE id = ")
            .push_bind(workspace_id.to_owned())
            .push(" AND owner_id = ")
            .push_bind(owner_id.to_owned());

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_share_token(
        &self,
        owner_id: &str,
        workspace_id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE workspaces SET share_token = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(token)
        .bind(updated_at)
        .bind(workspace_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips `is_public` in place and returns the new value.
    pub async fn toggle_workspace_public(
        &self,
        owner_id: &str,
        workspace_id: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<bool>> {
        let row = sqlx::query_as::<_, (bool,)>(
            "UPDATE workspaces SET is_public = NOT is_public, updated_at = ?
             WHERE id = ? AND owner_id = ?
             RETURNING is_public",
        )
        .bind(updated_at)
        .bind(workspace_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(is_public,)| is_public))
    }

    /// Removes the workspace, its tasks and their subtasks in one transaction.
    pub async fn delete_workspace(&self, owner_id: &str, workspace_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_as::<_, (String,)>(
            "SELECT id FROM workspaces WHERE id = ? AND owner_id = ?",
        )
        .bind(workspace_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;
        if owned.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "DELETE FROM subtasks WHERE task_id IN (SELECT id FROM tasks WHERE workspace_id = ?)",
        )
        .bind(workspace_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE workspace_id = ?")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
