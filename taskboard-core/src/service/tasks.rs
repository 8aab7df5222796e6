use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info};

use crate::db::Db;
use crate::error::{Error, Result};
use crate::models::{NewTask, Subtask, Task, TaskChanges, TaskFilters, new_id, touch};
use crate::validation::ValidationErrors;

/// Fills `subtasks` on each task with one query for the whole batch.
pub(crate) async fn attach_subtasks(db: &Db, mut tasks: Vec<Task>) -> Result<Vec<Task>> {
    let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
    let mut by_task: HashMap<String, Vec<Subtask>> = HashMap::new();
    for subtask in db.list_subtasks_for_tasks(&ids).await? {
        by_task.entry(subtask.task_id.clone()).or_default().push(subtask);
    }
    for task in &mut tasks {
        task.subtasks = by_task.remove(&task.id).unwrap_or_default();
    }
    Ok(tasks)
}

#[derive(Clone)]
pub struct TaskService {
    db: Db,
}

impl TaskService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, owner_id: &str, input: NewTask) -> Result<Task> {
        if let Some(workspace_id) = &input.workspace_id {
            self.ensure_workspace(owner_id, workspace_id).await?;
        }

        let now = Utc::now();
        let task = Task {
            id: new_id(),
            user_id: owner_id.to_owned(),
            workspace_id: input.workspace_id,
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
            subtasks: Vec::new(),
        };
        self.db.insert_task(&task).await?;

        info!(task_id = %task.id, owner_id, "task created");
        Ok(task)
    }

    pub async fn list(&self, owner_id: &str, filters: &TaskFilters) -> Result<Vec<Task>> {
        let tasks = self.db.list_tasks(owner_id, filters).await?;
        debug!(owner_id, count = tasks.len(), "tasks listed");
        attach_subtasks(&self.db, tasks).await
    }

    /// Not found covers both "no such task" and "someone else's task".
    pub async fn get(&self, owner_id: &str, task_id: &str) -> Result<Task> {
        let mut task = self
            .db
            .find_task(owner_id, task_id)
            .await?
            .ok_or(Error::NotFound("Task"))?;
        task.subtasks = self.db.list_subtasks(&task.id).await?;
        Ok(task)
    }

    pub async fn update(
        &self,
        owner_id: &str,
        task_id: &str,
        changes: TaskChanges,
    ) -> Result<Task> {
        let existing = self
            .db
            .find_task(owner_id, task_id)
            .await?
            .ok_or(Error::NotFound("Task"))?;

        if let Some(Some(workspace_id)) = &changes.workspace_id {
            self.ensure_workspace(owner_id, workspace_id).await?;
        }

        let updated = self
            .db
            .update_task(owner_id, task_id, &changes, touch(existing.updated_at))
            .await?;
        if !updated {
            return Err(Error::NotFound("Task"));
        }

        info!(task_id, owner_id, "task updated");
        self.get(owner_id, task_id).await
    }

    /// Returns whether a task was removed; its subtasks go with it.
    pub async fn delete(&self, owner_id: &str, task_id: &str) -> Result<bool> {
        let deleted = self.db.delete_task(owner_id, task_id).await?;
        if deleted {
            info!(task_id, owner_id, "task deleted");
        }
        Ok(deleted)
    }

    async fn ensure_workspace(&self, owner_id: &str, workspace_id: &str) -> Result<()> {
        if self.db.find_workspace(owner_id, workspace_id).await?.is_none() {
            return Err(ValidationErrors::single("workspaceId", "Workspace not found").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};
    use crate::test_support::seed_user;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_owned(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
            workspace_id: None,
        }
    }

    #[tokio::test]
    async fn update_refetches_and_preserves_untouched_fields() {
        let db = Db::open_in_memory().await.unwrap();
        let owner = seed_user(&db, "owner@example.com").await;
        let service = TaskService::new(db);

        let mut input = new_task("Draft");
        input.description = Some("first pass".into());
        let created = service.create(&owner.id, input).await.unwrap();

        let changes = TaskChanges {
            title: Some("Final".into()),
            ..Default::default()
        };
        let updated = service.update(&owner.id, &created.id, changes).await.unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description.as_deref(), Some("first pass"));
        assert_eq!(updated.status, created.status);
        assert_eq!(updated.priority, created.priority);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_foreign_workspace() {
        let db = Db::open_in_memory().await.unwrap();
        let owner = seed_user(&db, "owner@example.com").await;
        let service = TaskService::new(db);

        let mut input = new_task("Orphan");
        input.workspace_id = Some("missing".into());
        let err = service.create(&owner.id, input).await.unwrap_err();
        match err {
            Error::Validation(errors) => assert_eq!(errors.field_errors()[0].path, "workspaceId"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_task_is_not_found() {
        let db = Db::open_in_memory().await.unwrap();
        let owner = seed_user(&db, "owner@example.com").await;
        let service = TaskService::new(db);

        let err = service
            .update(&owner.id, "nope", TaskChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("Task")));
        assert!(!service.delete(&owner.id, "nope").await.unwrap());
    }
}
