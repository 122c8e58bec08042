//! Core types for the taskboard server.

use serde::{Deserialize, Serialize};

/// Task status. The store constrains the column to these three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// All valid status literals, for validation error messages.
    pub const ALL: [&'static str; 3] = ["pending", "in_progress", "completed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// Sort key for task listing. Closed set so the ORDER BY column is never
/// built from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    DueDate,
    CreatedAt,
    Title,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "due_date" => Some(SortKey::DueDate),
            "created_at" => Some(SortKey::CreatedAt),
            "title" => Some(SortKey::Title),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortKey::DueDate => "due_date",
            SortKey::CreatedAt => "created_at",
            SortKey::Title => "title",
        }
    }
}

/// Sort direction for task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A task row. Timestamps are epoch milliseconds (UTC).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: i64,
    pub status: TaskStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Validated input for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: i64,
    pub status: TaskStatus,
}

/// Validated partial update. Outer `None` means "leave unchanged";
/// `description` carries a second level so `Some(None)` clears the field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<i64>,
    pub status: Option<TaskStatus>,
}

/// Validated listing query: optional status filter plus a single sort key.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub status: Option<TaskStatus>,
    pub sort_by: SortKey,
    pub sort_direction: SortDirection,
}
