//! RPC procedure implementations.
//!
//! Each procedure maps 1:1 to a repository operation: deserialize, validate,
//! invoke, serialize. No business logic lives here.

mod server;

pub use server::{router, serve};

use crate::db::Database;
use crate::error::{RpcError, RpcResult};
use crate::validate;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Names of all exposed procedures.
pub const PROCEDURES: [&str; 6] = [
    "healthcheck",
    "createTask",
    "getTasks",
    "getTaskById",
    "updateTask",
    "deleteTask",
];

/// RPC handler that processes procedure calls by name.
pub struct RpcHandler {
    db: Arc<Database>,
}

impl RpcHandler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Call a procedure by name with a JSON payload.
    pub fn call(&self, procedure: &str, args: &Value) -> RpcResult<Value> {
        match procedure {
            "healthcheck" => Ok(json!({
                "status": "ok",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),

            "createTask" => {
                let input = validate::validate_create(args)?;
                let task = self.db.create_task(input).map_err(RpcError::from)?;
                to_value(task)
            }

            "getTasks" => {
                let query = validate::validate_query(args)?;
                let tasks = self.db.list_tasks(&query).map_err(RpcError::from)?;
                to_value(tasks)
            }

            "getTaskById" => {
                let id = validate::validate_id(args)?;
                match self.db.get_task(id).map_err(RpcError::from)? {
                    Some(task) => to_value(task),
                    // Absence is a normal outcome here, not an error.
                    None => Ok(Value::Null),
                }
            }

            "updateTask" => {
                let (id, patch) = validate::validate_update(args)?;
                let task = self.db.update_task(id, patch).map_err(RpcError::from)?;
                to_value(task)
            }

            "deleteTask" => {
                let id = validate::validate_id(args)?;
                self.db.delete_task(id).map_err(RpcError::from)?;
                Ok(json!({ "success": true }))
            }

            _ => Err(RpcError::unknown_procedure(procedure)),
        }
    }
}

fn to_value<T: Serialize>(value: T) -> RpcResult<Value> {
    serde_json::to_value(value).map_err(RpcError::internal)
}
