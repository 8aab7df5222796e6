use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use super::Db;
use crate::error::Result;
use crate::models::{SortOrder, Task, TaskChanges, TaskFilters, TaskSortField};

const TASK_COLUMNS: &str = "id, user_id, workspace_id, title, description, status, priority, \
                            due_date, created_at, updated_at";

/// Case-insensitive substring match over title or description. SQLite's
/// `LOWER` only folds ASCII, so this runs on both sides with Unicode rules.
fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

fn push_order_by(query: &mut QueryBuilder<'_, Sqlite>, field: TaskSortField, order: SortOrder) {
    let dir = order.as_sql();
    match field {
        TaskSortField::CreatedAt => query.push(format!(" ORDER BY created_at {dir}")),
        TaskSortField::UpdatedAt => {
            query.push(format!(" ORDER BY updated_at {dir}, created_at DESC"))
        }
        // Undated tasks sink to the bottom whichever way the list is sorted.
        TaskSortField::DueDate => query.push(format!(
            " ORDER BY due_date IS NULL, due_date {dir}, created_at DESC"
        )),
        TaskSortField::Priority => query.push(format!(
            " ORDER BY CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END {dir}, \
             created_at DESC"
        )),
    };
}

impl Db {
    pub async fn insert_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            "INSERT INTO tasks (id, user_id, workspace_id, title, description, status, priority,
                                due_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.user_id)
        .bind(&task.workspace_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The task, only if `owner_id` owns it.
    pub async fn find_task(&self, owner_id: &str, task_id: &str) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND user_id = ?"
        ))
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_tasks(&self, owner_id: &str, filters: &TaskFilters) -> Result<Vec<Task>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = "
        ));
        query.push_bind(owner_id.to_owned());

        if let Some(status) = filters.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filters.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(workspace_id) = &filters.workspace_id {
            query.push(" AND workspace_id = ").push_bind(workspace_id.clone());
        }
        push_order_by(&mut query, filters.sort_by, filters.sort_order);

        let mut rows = query.build_query_as::<Task>().fetch_all(&self.pool).await?;
        if let Some(search) = &filters.search {
            let needle = search.to_lowercase();
            rows.retain(|task| matches_search(task, &needle));
        }
        Ok(rows)
    }

    /// Every task filed under a workspace, regardless of owner.
    pub async fn list_tasks_in_workspace(&self, workspace_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE workspace_id = ? ORDER BY created_at DESC"
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Writes only the fields present in `changes`. Returns false if no owned row matched.
    pub async fn update_task(
        &self,
        owner_id: &str,
        task_id: &str,
        changes: &TaskChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE tasks SET updated_at = ");
        query.push_bind(updated_at);

        if let Some(title) = &changes.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &changes.description {
            query.push(", description = ").push_bind(description.clone());
        }
        if let Some(status) = changes.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(priority) = changes.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = changes.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(workspace_id) = &changes.workspace_id {
            query.push(", workspace_id = ").push_bind(workspace_id.clone());
        }

        query
            .push(" WHERE id = ")
            .push_bind(task_id.to_owned())
            .push(" AND user_id = ")
            .push_bind(owner_id.to_owned());

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Removes the task and its subtasks atomically.
    pub async fn delete_task(&self, owner_id: &str, task_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM subtasks
             WHERE task_id IN (SELECT id FROM tasks WHERE id = ? AND user_id = ?)",
        )
        .bind(task_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(task_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
