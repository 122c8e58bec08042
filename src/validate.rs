//! Request validation and coercion.
//!
//! Every RPC payload passes through here before the repository is touched.
//! Working on raw `serde_json::Value` keeps "field absent" and "field set to
//! null" distinguishable, which the partial-update contract depends on.

use crate::error::{RpcError, RpcResult};
use crate::types::{ListQuery, NewTask, SortDirection, SortKey, TaskPatch, TaskStatus};
use serde_json::Value;

/// Helper to get a string from arguments.
fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Coerce a JSON value to an epoch-millisecond timestamp.
///
/// Accepts integer epoch milliseconds, RFC 3339 strings, and plain
/// `YYYY-MM-DD` dates (midnight UTC).
fn coerce_datetime(value: &Value, field: &str) -> RpcResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| RpcError::invalid_value(field, format!("{} is not a valid epoch-millisecond timestamp", field))),
        Value::String(s) => parse_datetime_str(s).ok_or_else(|| {
            RpcError::invalid_value(
                field,
                format!("{} must be an RFC 3339 datetime or YYYY-MM-DD date", field),
            )
        }),
        _ => Err(RpcError::invalid_value(
            field,
            format!("{} must be a datetime string or epoch milliseconds", field),
        )),
    }
}

fn parse_datetime_str(s: &str) -> Option<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

/// Parse a status value against the three enumerated literals.
fn parse_status(value: &Value, field: &str) -> RpcResult<TaskStatus> {
    let s = value.as_str().ok_or_else(|| {
        RpcError::invalid_value(field, format!("{} must be a string", field))
    })?;
    TaskStatus::parse(s).ok_or_else(|| {
        RpcError::invalid_value(
            field,
            format!("invalid status '{}', expected one of {:?}", s, TaskStatus::ALL),
        )
    })
}

/// Extract a required numeric id.
pub fn validate_id(args: &Value) -> RpcResult<i64> {
    let value = args.get("id").ok_or_else(|| RpcError::missing_field("id"))?;
    value
        .as_i64()
        .ok_or_else(|| RpcError::invalid_value("id", "id must be an integer"))
}

/// Validate a createTask payload.
pub fn validate_create(args: &Value) -> RpcResult<NewTask> {
    let title = get_string(args, "title").ok_or_else(|| RpcError::missing_field("title"))?;
    if title.is_empty() {
        return Err(RpcError::invalid_value("title", "title must not be empty"));
    }

    let description = match args.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(RpcError::invalid_value(
                "description",
                "description must be a string or null",
            ));
        }
    };

    let due_date = coerce_datetime(
        args.get("due_date")
            .ok_or_else(|| RpcError::missing_field("due_date"))?,
        "due_date",
    )?;

    let status = match args.get("status") {
        None | Some(Value::Null) => TaskStatus::default(),
        Some(v) => parse_status(v, "status")?,
    };

    Ok(NewTask {
        title,
        description,
        due_date,
        status,
    })
}

/// Validate an updateTask payload into an id plus a field patch.
///
/// A field absent from the payload stays untouched; `description: null`
/// explicitly clears the field.
pub fn validate_update(args: &Value) -> RpcResult<(i64, TaskPatch)> {
    let id = validate_id(args)?;

    let title = match args.get("title") {
        None => None,
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            return Err(RpcError::invalid_value("title", "title must not be empty"));
        }
        Some(_) => {
            return Err(RpcError::invalid_value("title", "title must be a string"));
        }
    };

    let description = match args.get("description") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => {
            return Err(RpcError::invalid_value(
                "description",
                "description must be a string or null",
            ));
        }
    };

    let due_date = match args.get("due_date") {
        None => None,
        Some(v) => Some(coerce_datetime(v, "due_date")?),
    };

    let status = match args.get("status") {
        None => None,
        Some(v) => Some(parse_status(v, "status")?),
    };

    Ok((
        id,
        TaskPatch {
            title,
            description,
            due_date,
            status,
        },
    ))
}

/// Validate a getTasks query. Missing fields fall back to the defaults
/// (sort by due date, ascending, no status filter).
pub fn validate_query(args: &Value) -> RpcResult<ListQuery> {
    let status = match args.get("status") {
        None | Some(Value::Null) => None,
        Some(v) => Some(parse_status(v, "status")?),
    };

    let sort_by = match args.get("sortBy") {
        None | Some(Value::Null) => SortKey::default(),
        Some(Value::String(s)) => SortKey::parse(s).ok_or_else(|| {
            RpcError::invalid_value(
                "sortBy",
                format!(
                    "invalid sortBy '{}', expected one of [\"due_date\", \"created_at\", \"title\"]",
                    s
                ),
            )
        })?,
        Some(_) => {
            return Err(RpcError::invalid_value("sortBy", "sortBy must be a string"));
        }
    };

    let sort_direction = match args.get("sortDirection") {
        None | Some(Value::Null) => SortDirection::default(),
        Some(Value::String(s)) => SortDirection::parse(s).ok_or_else(|| {
            RpcError::invalid_value(
                "sortDirection",
                format!("invalid sortDirection '{}', expected \"asc\" or \"desc\"", s),
            )
        })?,
        Some(_) => {
            return Err(RpcError::invalid_value(
                "sortDirection",
                "sortDirection must be a string",
            ));
        }
    };

    Ok(ListQuery {
        status,
        sort_by,
        sort_direction,
    })
}
