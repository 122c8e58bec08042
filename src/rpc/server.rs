//! HTTP transport for the RPC surface.
//!
//! One axum route carries every procedure: `POST /rpc/{procedure}` with the
//! JSON input as the request body. `GET /health` answers liveness probes
//! without touching the store.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::RpcHandler;
use crate::db::Database;
use crate::error::ErrorCode;

/// RPC server state shared across handlers.
#[derive(Clone)]
struct RpcServer {
    handler: Arc<RpcHandler>,
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Map an error code to the HTTP status of the response carrying it.
fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,
        ErrorCode::TaskNotFound | ErrorCode::UnknownProcedure => StatusCode::NOT_FOUND,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Single RPC endpoint: dispatches on the procedure name in the path.
/// An empty body is treated as an empty payload so parameterless
/// procedures can be called without one.
async fn rpc_call(
    State(state): State<RpcServer>,
    Path(procedure): Path<String>,
    body: Bytes,
) -> Response {
    let args: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                warn!(procedure = %procedure, error = %e, "Malformed request body");
                let err = crate::error::RpcError::new(
                    ErrorCode::InvalidFieldValue,
                    format!("request body is not valid JSON: {}", e),
                );
                let error_json = serde_json::to_value(&err)
                    .unwrap_or_else(|_| json!({ "error": err.to_string() }));
                return (StatusCode::BAD_REQUEST, Json(error_json)).into_response();
            }
        }
    };
    let start = std::time::Instant::now();

    match state.handler.call(&procedure, &args) {
        Ok(result) => {
            let elapsed = start.elapsed();
            debug!(
                procedure = %procedure,
                duration_ms = elapsed.as_millis() as u64,
                "RPC call succeeded"
            );
            Json(result).into_response()
        }
        Err(e) => {
            let elapsed = start.elapsed();
            warn!(
                procedure = %procedure,
                error_code = ?e.code,
                error_message = %e.message,
                duration_ms = elapsed.as_millis() as u64,
                "RPC call failed"
            );
            let error_json = serde_json::to_value(&e)
                .unwrap_or_else(|_| json!({ "error": e.to_string() }));
            (status_for(e.code), Json(error_json)).into_response()
        }
    }
}

/// Build the router with all routes.
pub fn router(handler: Arc<RpcHandler>) -> Router {
    // Permissive CORS so the browser client can call from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/rpc/{procedure}", post(rpc_call))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(RpcServer { handler })
}

/// Bind the listener and serve RPC requests until the process exits.
pub async fn serve(db: Arc<Database>, port: u16) -> anyhow::Result<()> {
    let handler = Arc::new(RpcHandler::new(db));
    let app = router(handler);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("RPC server listening on http://{}", bound_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
