//! Request schemas and their validation.
//!
//! Each `*Input` type is the loosely typed shape a client sends. `Validate`
//! turns it into the strongly typed parameters the services accept, or into a
//! list of `{path, message}` pairs describing every bad field at once.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{
    NewSubtask, NewTask, NewWorkspace, SortOrder, SubtaskChanges, TaskChanges, TaskFilters,
    TaskPriority, TaskSortField, TaskStatus, WorkspaceChanges,
};

pub const TASK_TITLE_MAX: usize = 200;
pub const TASK_DESCRIPTION_MAX: usize = 2000;
pub const SUBTASK_TITLE_MAX: usize = 200;
pub const WORKSPACE_NAME_MAX: usize = 100;
pub const WORKSPACE_DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(path, message);
        errors
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_field_errors(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.path, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A schema: raw input in, typed parameters or field errors out.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, ValidationErrors>;
}

pub fn validate<T: Validate>(input: T) -> Result<T::Output, ValidationErrors> {
    input.validate()
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
/// Pair with `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_length(
    errors: &mut ValidationErrors,
    path: &str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(path, format!("{label} is required"));
    } else if len > max {
        errors.push(path, format!("{label} must be less than {max} characters"));
    }
}

fn required<'a>(
    errors: &mut ValidationErrors,
    path: &str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match value {
        Some(v) => Some(v.as_str()),
        None => {
            errors.push(path, "Required");
            None
        }
    }
}

/// For update fields that may be omitted but not nulled.
fn not_null<'a, T>(
    errors: &mut ValidationErrors,
    path: &str,
    value: &'a Option<Option<T>>,
) -> Option<&'a T> {
    match value {
        None => None,
        Some(None) => {
            errors.push(path, "Expected a value, received null");
            None
        }
        Some(Some(v)) => Some(v),
    }
}

fn enum_message(expected: &[&str], received: &str) -> String {
    let expected = expected
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("Invalid enum value. Expected {expected}, received '{received}'")
}

fn parse_status(errors: &mut ValidationErrors, path: &str, raw: &str) -> Option<TaskStatus> {
    let parsed = TaskStatus::parse(raw);
    if parsed.is_none() {
        let names = TaskStatus::ALL.map(TaskStatus::as_str);
        errors.push(path, enum_message(&names, raw));
    }
    parsed
}

fn parse_priority(errors: &mut ValidationErrors, path: &str, raw: &str) -> Option<TaskPriority> {
    let parsed = TaskPriority::parse(raw);
    if parsed.is_none() {
        let names = TaskPriority::ALL.map(TaskPriority::as_str);
        errors.push(path, enum_message(&names, raw));
    }
    parsed
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_due_date(errors: &mut ValidationErrors, path: &str, raw: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        errors.push(path, "Invalid datetime");
    }
    parsed
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub workspace_id: Option<String>,
}

impl Validate for CreateTaskInput {
    type Output = NewTask;

    fn validate(self) -> Result<NewTask, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(title) = required(&mut errors, "title", &self.title) {
            check_length(&mut errors, "title", "Title", title, 1, TASK_TITLE_MAX);
        }
        if let Some(description) = &self.description {
            check_length(
                &mut errors,
                "description",
                "Description",
                description,
                0,
                TASK_DESCRIPTION_MAX,
            );
        }
        let status = match &self.status {
            Some(raw) => parse_status(&mut errors, "status", raw),
            None => Some(TaskStatus::default()),
        };
        let priority = match &self.priority {
            Some(raw) => parse_priority(&mut errors, "priority", raw),
            None => Some(TaskPriority::default()),
        };
        let due_date = self
            .due_date
            .as_deref()
            .map(|raw| parse_due_date(&mut errors, "dueDate", raw));

        errors.finish(())?;
        Ok(NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description,
            status: status.unwrap_or_default(),
            priority: priority.unwrap_or_default(),
            due_date: due_date.flatten(),
            workspace_id: self.workspace_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub priority: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub workspace_id: Option<Option<String>>,
}

impl Validate for UpdateTaskInput {
    type Output = TaskChanges;

    fn validate(self) -> Result<TaskChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = not_null(&mut errors, "title", &self.title).cloned();
        if let Some(title) = &title {
            check_length(&mut errors, "title", "Title", title, 1, TASK_TITLE_MAX);
        }
        if let Some(Some(description)) = &self.description {
            check_length(
                &mut errors,
                "description",
                "Description",
                description,
                0,
                TASK_DESCRIPTION_MAX,
            );
        }
        let status = not_null(&mut errors, "status", &self.status)
            .and_then(|raw| parse_status(&mut errors, "status", raw));
        let priority = not_null(&mut errors, "priority", &self.priority)
            .and_then(|raw| parse_priority(&mut errors, "priority", raw));
        let due_date = match &self.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(parse_due_date(&mut errors, "dueDate", raw)),
        };

        errors.finish(TaskChanges {
            title,
            description: self.description,
            status,
            priority,
            due_date,
            workspace_id: self.workspace_id,
        })
    }
}

/// Query string of `GET /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub workspace_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl Validate for TaskListQuery {
    type Output = TaskFilters;

    fn validate(self) -> Result<TaskFilters, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let status = self
            .status
            .as_deref()
            .and_then(|raw| parse_status(&mut errors, "status", raw));
        let priority = self
            .priority
            .as_deref()
            .and_then(|raw| parse_priority(&mut errors, "priority", raw));
        let sort_by = match self.sort_by.as_deref() {
            None => TaskSortField::default(),
            Some(raw) => TaskSortField::parse(raw).unwrap_or_else(|| {
                let names = TaskSortField::ALL.map(TaskSortField::as_str);
                errors.push("sortBy", enum_message(&names, raw));
                TaskSortField::default()
            }),
        };
        let sort_order = match self.sort_order.as_deref() {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).unwrap_or_else(|| {
                errors.push("sortOrder", enum_message(&["asc", "desc"], raw));
                SortOrder::default()
            }),
        };

        errors.finish(TaskFilters {
            status,
            priority,
            // An empty search box means no search.
            search: self.search.filter(|s| !s.is_empty()),
            workspace_id: self.workspace_id.filter(|s| !s.is_empty()),
            sort_by,
            sort_order,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Validate for CreateWorkspaceInput {
    type Output = NewWorkspace;

    fn validate(self) -> Result<NewWorkspace, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = required(&mut errors, "name", &self.name) {
            check_length(&mut errors, "name", "Name", name, 1, WORKSPACE_NAME_MAX);
        }
        if let Some(description) = &self.description {
            check_length(
                &mut errors,
                "description",
                "Description",
                description,
                0,
                WORKSPACE_DESCRIPTION_MAX,
            );
        }
        errors.finish(NewWorkspace {
            name: self.name.unwrap_or_default(),
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceInput {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_public: Option<Option<bool>>,
}

impl Validate for UpdateWorkspaceInput {
    type Output = WorkspaceChanges;

    fn validate(self) -> Result<WorkspaceChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = not_null(&mut errors, "name", &self.name).cloned();
        if let Some(name) = &name {
            check_length(&mut errors, "name", "Name", name, 1, WORKSPACE_NAME_MAX);
        }
        if let Some(Some(description)) = &self.description {
            check_length(
                &mut errors,
                "description",
                "Description",
                description,
                0,
                WORKSPACE_DESCRIPTION_MAX,
            );
        }
        let is_public = not_null(&mut errors, "isPublic", &self.is_public).copied();
        errors.finish(WorkspaceChanges {
            name,
            description: self.description,
            is_public,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubtaskInput {
    pub task_id: Option<String>,
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl Validate for CreateSubtaskInput {
    type Output = NewSubtask;

    fn validate(self) -> Result<NewSubtask, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(task_id) = required(&mut errors, "taskId", &self.task_id) {
            if task_id.is_empty() {
                errors.push("taskId", "Task ID is required");
            }
        }
        if let Some(title) = required(&mut errors, "title", &self.title) {
            check_length(&mut errors, "title", "Title", title, 1, SUBTASK_TITLE_MAX);
        }
        errors.finish(NewSubtask {
            task_id: self.task_id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubtaskInput {
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub completed: Option<Option<bool>>,
}

impl Validate for UpdateSubtaskInput {
    type Output = SubtaskChanges;

    fn validate(self) -> Result<SubtaskChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = not_null(&mut errors, "title", &self.title).cloned();
        if let Some(title) = &title {
            check_length(&mut errors, "title", "Title", title, 1, SUBTASK_TITLE_MAX);
        }
        let completed = not_null(&mut errors, "completed", &self.completed).copied();
        errors.finish(SubtaskChanges { title, completed })
    }
}

/// Query string of `GET /api/subtasks`; resolves to the parent task id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskListQuery {
    pub task_id: Option<String>,
}

impl Validate for SubtaskListQuery {
    type Output = String;

    fn validate(self) -> Result<String, ValidationErrors> {
        match self.task_id.filter(|id| !id.is_empty()) {
            Some(task_id) => Ok(task_id),
            None => Err(ValidationErrors::single("taskId", "Required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(errors: &ValidationErrors) -> Vec<&str> {
        errors.field_errors().iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn create_task_applies_defaults() {
        let input: CreateTaskInput =
            serde_json::from_value(json!({ "title": "Write docs" })).unwrap();
        let task = validate(input).unwrap();
        assert_eq!(task.title, "Write docs");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.due_date, None);
        assert_eq!(task.workspace_id, None);
    }

    #[test]
    fn create_task_reports_every_bad_field() {
        let input: CreateTaskInput = serde_json::from_value(json!({
            "description": "x".repeat(2001),
            "status": "blocked",
            "priority": "urgent",
            "dueDate": "next tuesday",
        }))
        .unwrap();
        let errors = validate(input).unwrap_err();
        assert_eq!(paths(&errors), ["title", "description", "status", "priority", "dueDate"]);
        assert_eq!(errors.field_errors()[0].message, "Required");
        assert!(errors.field_errors()[2].message.contains("'in_progress'"));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let ok = CreateTaskInput {
            title: Some("é".repeat(200)),
            ..Default::default()
        };
        assert!(validate(ok).is_ok());

        let too_long = CreateTaskInput {
            title: Some("a".repeat(201)),
            ..Default::default()
        };
        let errors = validate(too_long).unwrap_err();
        assert_eq!(errors.field_errors()[0].message, "Title must be less than 200 characters");

        let empty = CreateTaskInput {
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(paths(&validate(empty).unwrap_err()), ["title"]);
    }

    #[test]
    fn due_dates_accept_rfc3339_and_plain_dates() {
        let at = parse_timestamp("2025-06-01T09:30:00Z").unwrap();
        assert_eq!(at.to_rfc3339(), "2025-06-01T09:30:00+00:00");
        let offset = parse_timestamp("2025-06-01T11:30:00+02:00").unwrap();
        assert_eq!(offset, at);
        let day = parse_timestamp("2025-06-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-06-01T00:00:00+00:00");
        assert!(parse_timestamp("2025-13-01").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn update_task_distinguishes_absent_from_null() {
        let input: UpdateTaskInput =
            serde_json::from_value(json!({ "description": null, "dueDate": null })).unwrap();
        let changes = validate(input).unwrap();
        assert_eq!(changes.title, None);
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.due_date, Some(None));
        assert_eq!(changes.status, None);
        assert_eq!(changes.workspace_id, None);

        let untouched = validate(UpdateTaskInput::default()).unwrap();
        assert_eq!(untouched, TaskChanges::default());
    }

    #[test]
    fn update_task_rejects_null_for_required_columns() {
        let input: UpdateTaskInput =
            serde_json::from_value(json!({ "title": null, "status": null })).unwrap();
        let errors = validate(input).unwrap_err();
        assert_eq!(paths(&errors), ["title", "status"]);
    }

    #[test]
    fn update_task_rejects_bad_dates_instead_of_clearing() {
        let input: UpdateTaskInput = serde_json::from_value(json!({ "dueDate": "soon" })).unwrap();
        let errors = validate(input).unwrap_err();
        assert_eq!(errors.field_errors()[0].path, "dueDate");
        assert_eq!(errors.field_errors()[0].message, "Invalid datetime");
    }

    #[test]
    fn list_query_parses_filters_and_sort() {
        let query = TaskListQuery {
            status: Some("done".into()),
            priority: Some("high".into()),
            search: Some(String::new()),
            sort_by: Some("dueDate".into()),
            sort_order: Some("asc".into()),
            ..Default::default()
        };
        let filters = validate(query).unwrap();
        assert_eq!(filters.status, Some(TaskStatus::Done));
        assert_eq!(filters.priority, Some(TaskPriority::High));
        assert_eq!(filters.search, None);
        assert_eq!(filters.sort_by, TaskSortField::DueDate);
        assert_eq!(filters.sort_order, SortOrder::Asc);

        let bad = TaskListQuery {
            sort_by: Some("title".into()),
            sort_order: Some("up".into()),
            ..Default::default()
        };
        assert_eq!(paths(&validate(bad).unwrap_err()), ["sortBy", "sortOrder"]);
    }

    #[test]
    fn workspace_limits() {
        let input = CreateWorkspaceInput {
            name: Some("n".repeat(101)),
            description: Some("d".repeat(501)),
        };
        assert_eq!(paths(&validate(input).unwrap_err()), ["name", "description"]);

        let update: UpdateWorkspaceInput =
            serde_json::from_value(json!({ "isPublic": true, "description": null })).unwrap();
        let changes = validate(update).unwrap();
        assert_eq!(changes.is_public, Some(true));
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.name, None);
    }

    #[test]
    fn subtask_schemas() {
        let input: CreateSubtaskInput =
            serde_json::from_value(json!({ "taskId": "t1", "title": "Check logs" })).unwrap();
        let subtask = validate(input).unwrap();
        assert!(!subtask.completed);

        let missing: CreateSubtaskInput = serde_json::from_value(json!({})).unwrap();
        assert_eq!(paths(&validate(missing).unwrap_err()), ["taskId", "title"]);

        let query: SubtaskListQuery = serde_json::from_value(json!({ "taskId": "" })).unwrap();
        assert_eq!(query.validate().unwrap_err().field_errors()[0].path, "taskId");

        let update: UpdateSubtaskInput =
            serde_json::from_value(json!({ "completed": true })).unwrap();
        assert_eq!(
            validate(update).unwrap(),
            SubtaskChanges {
                title: None,
                completed: Some(true)
            }
        );
    }

    #[test]
    fn errors_display_as_path_message_pairs() {
        let mut errors = ValidationErrors::single("title", "Required");
        errors.push("status", "bad");
        assert_eq!(errors.to_string(), "title: Required; status: bad");
    }
}
