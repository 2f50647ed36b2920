use axum::Json;
use serde_json::{json, Value};

/// GET /api/health
/// Fixed liveness payload; touches no collaborator.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Backend is healthy!",
        "service": "intake-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
