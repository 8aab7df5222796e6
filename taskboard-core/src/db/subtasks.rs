use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use super::Db;
use crate::error::Result;
use crate::models::{Subtask, SubtaskChanges};

const SUBTASK_COLUMNS: &str = "id, task_id, title, completed, created_at, updated_at";

const TASK_ID_BATCH: usize = 500;

impl Db {
    pub async fn insert_subtask(&self, subtask: &Subtask) -> Result<()> {
        sqlx::query(
            "INSERT INTO subtasks (id, task_id, title, completed, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&subtask.id)
        .bind(&subtask.task_id)
        .bind(&subtask.title)
        .bind(subtask.completed)
        .bind(subtask.created_at)
        .bind(subtask.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_subtasks(&self, task_id: &str) -> Result<Vec<Subtask>> {
        let rows = sqlx::query_as::<_, Subtask>(&format!(
            "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE task_id = ? ORDER BY created_at, id"
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Subtasks of several tasks, oldest first. Ids are bound in batches to stay
    /// under SQLite's host parameter limit.
    pub async fn list_subtasks_for_tasks(&self, task_ids: &[String]) -> Result<Vec<Subtask>> {
        let mut rows = Vec::new();
        for batch in task_ids.chunks(TASK_ID_BATCH) {
            let mut query = QueryBuilder::<Sqlite>::new(format!(
                "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE task_id IN ("
            ));
            let mut ids = query.separated(", ");
            for id in batch {
                ids.push_bind(id.clone());
            }
            query.push(")");

            rows.extend(query.build_query_as::<Subtask>().fetch_all(&self.pool).await?);
        }

        rows.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(rows)
    }

    /// The subtask, only if its parent task belongs to `owner_id`.
    pub async fn find_owned_subtask(
        &self,
        owner_id: &str,
        subtask_id: &str,
    ) -> Result<Option<Subtask>> {
        let row = sqlx::query_as::<_, Subtask>(
            "SELECT s.id, s.task_id, s.title, s.completed, s.created_at, s.updated_at
             FROM subtasks s
             JOIN tasks t ON t.id = s.task_id
             WHERE s.id = ? AND t.user_id = ?",
        )
        .bind(subtask_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_subtask(
        &self,
        subtask_id: &str,
        changes: &SubtaskChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Subtask>> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE subtasks SET updated_at = ");
        query.push_bind(updated_at);

        if let Some(title) = &changes.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(completed) = changes.completed {
            query.push(", completed = ").push_bind(completed);
        }

        query
            .push(" WHERE id = ")
            .push_bind(subtask_id.to_owned())
            .push(format!(" RETURNING {SUBTASK_COLUMNS}"));

        let row = query.build_query_as::<Subtask>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    pub async fn toggle_subtask(
        &self,
        subtask_id: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Subtask>> {
        let row = sqlx::query_as::<_, Subtask>(&format!(
            "UPDATE subtasks SET completed = NOT completed, updated_at = ?
             WHERE id = ?
             RETURNING {SUBTASK_COLUMNS}"
        ))
        .bind(updated_at)
        .bind(subtask_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_subtask(&self, subtask_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = ?")
            .bind(subtask_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
