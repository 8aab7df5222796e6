use chrono::Utc;
use tracing::info;

use crate::db::Db;
use crate::error::{Error, Result};
use crate::models::{NewSubtask, Subtask, SubtaskChanges, new_id, touch};

/// Checklist items under a task. Every operation first confirms the caller
/// owns the parent task.
#[derive(Clone)]
pub struct SubtaskService {
    db: Db,
}

impl SubtaskService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, owner_id: &str, input: NewSubtask) -> Result<Subtask> {
        self.ensure_task(owner_id, &input.task_id).await?;

        let now = Utc::now();
        let subtask = Subtask {
            id: new_id(),
            task_id: input.task_id,
            title: input.title,
            completed: input.completed,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_subtask(&subtask).await?;

        info!(subtask_id = %subtask.id, task_id = %subtask.task_id, "subtask created");
        Ok(subtask)
    }

    /// Oldest first.
    pub async fn list_for_task(&self, owner_id: &str, task_id: &str) -> Result<Vec<Subtask>> {
        self.ensure_task(owner_id, task_id).await?;
        self.db.list_subtasks(task_id).await
    }

    pub async fn update(
        &self,
        owner_id: &str,
        subtask_id: &str,
        changes: SubtaskChanges,
    ) -> Result<Subtask> {
        let existing = self.owned(owner_id, subtask_id).await?;
        let subtask = self
            .db
            .update_subtask(subtask_id, &changes, touch(existing.updated_at))
            .await?
            .ok_or(Error::NotFound("Subtask"))?;

        info!(subtask_id, "subtask updated");
        Ok(subtask)
    }

    pub async fn toggle(&self, owner_id: &str, subtask_id: &str) -> Result<Subtask> {
        let existing = self.owned(owner_id, subtask_id).await?;
        let subtask = self
            .db
            .toggle_subtask(subtask_id, touch(existing.updated_at))
            .await?
            .ok_or(Error::NotFound("Subtask"))?;

        info!(subtask_id, completed = subtask.completed, "subtask toggled");
        Ok(subtask)
    }

    pub async fn delete(&self, owner_id: &str, subtask_id: &str) -> Result<bool> {
        if self.db.find_owned_subtask(owner_id, subtask_id).await?.is_none() {
            return Ok(false);
        }
        let deleted = self.db.delete_subtask(subtask_id).await?;
        if deleted {
            info!(subtask_id, "subtask deleted");
        }
        Ok(deleted)
    }

    async fn owned(&self, owner_id: &str, subtask_id: &str) -> Result<Subtask> {
        self.db
            .find_owned_subtask(owner_id, subtask_id)
            .await?
            .ok_or(Error::NotFound("Subtask"))
    }

    async fn ensure_task(&self, owner_id: &str, task_id: &str) -> Result<()> {
        if self.db.find_task(owner_id, task_id).await?.is_none() {
            return Err(Error::NotFound("Task"));
        }
        Ok(())
    }
}
