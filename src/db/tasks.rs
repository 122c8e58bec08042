//! Task CRUD operations.

use super::{now_ms, Database};
use crate::error::RpcError;
use crate::types::{ListQuery, NewTask, Task, TaskPatch, TaskStatus};
use anyhow::Result;
use rusqlite::{params, Connection, Row};

/// Build an ORDER BY clause from the validated listing query.
/// Both pieces come from closed enums, so the expression is always safe SQL.
fn build_order_clause(query: &ListQuery) -> String {
    format!(
        "{} {}",
        query.sort_by.column(),
        query.sort_direction.as_sql()
    )
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let id: i64 = row.get("id")?;
    let title: String = row.get("title")?;
    let description: Option<String> = row.get("description")?;
    let due_date: i64 = row.get("due_date")?;
    let status_raw: String = row.get("status")?;
    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;

    // The CHECK constraint makes this unreachable for rows we wrote, but a
    // hand-edited database should fail loudly rather than default silently.
    let status = TaskStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown task status '{}'", status_raw).into(),
        )
    })?;

    Ok(Task {
        id,
        title,
        description,
        due_date,
        status,
        created_at,
        updated_at,
    })
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a new task. The store assigns the id; both timestamps carry
    /// the same creation instant.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, description, due_date, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &input.title,
                    &input.description,
                    input.due_date,
                    input.status.as_str(),
                    now,
                    now,
                ],
            )?;

            let id = conn.last_insert_rowid();

            Ok(Task {
                id,
                title: input.title,
                description: input.description,
                due_date: input.due_date,
                status: input.status,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Get a task by id. Absence is a normal outcome, not an error.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks with an optional status filter and a single-column sort.
    /// The filter is applied first, then the remaining rows are ordered.
    pub fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(status) = query.status {
                sql.push_str(" WHERE status = ?");
                params_vec.push(Box::new(status.as_str().to_string()));
            }

            let order_clause = build_order_clause(query);
            sql.push_str(&format!(" ORDER BY {}", order_clause));

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }

    /// Partially update a task. Only fields present in the patch change;
    /// `updated_at` is refreshed regardless. Fails when the id is unknown
    /// rather than silently doing nothing.
    pub fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| RpcError::task_not_found(task_id))?;

            let new_title = patch.title.unwrap_or(task.title);
            let new_description = patch.description.unwrap_or(task.description);
            let new_due_date = patch.due_date.unwrap_or(task.due_date);
            let new_status = patch.status.unwrap_or(task.status);

            tx.execute(
                "UPDATE tasks SET
                    title = ?1, description = ?2, due_date = ?3, status = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    &new_title,
                    &new_description,
                    new_due_date,
                    new_status.as_str(),
                    now,
                    task_id,
                ],
            )?;

            tx.commit()?;

            Ok(Task {
                id: task_id,
                title: new_title,
                description: new_description,
                due_date: new_due_date,
                status: new_status,
                created_at: task.created_at,
                updated_at: now,
            })
        })
    }

    /// Delete a task permanently. Fails when the id is unknown.
    pub fn delete_task(&self, task_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            if affected == 0 {
                return Err(RpcError::task_not_found(task_id).into());
            }

            Ok(())
        })
    }
}
