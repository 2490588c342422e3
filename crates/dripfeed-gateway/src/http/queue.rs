//! Queue inspection and manual editing.
//!
//! Bodies are parsed as loose JSON so a missing or non-string `text` gets
//! the same 400 as a blank one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::{failure, ApiResult};
use crate::app::AppState;
use crate::error::PipelineError;

fn text_field(body: &Value) -> &str {
    body.get("text").and_then(Value::as_str).unwrap_or_default()
}

/// GET /api/status: queue and history sizes, publish mode, scheduled jobs.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state
        .pipeline
        .queue()
        .snapshot()
        .map_err(PipelineError::from)?;
    let processed = state
        .pipeline
        .ledger()
        .processed_count()
        .map_err(PipelineError::from)?;
    Ok(Json(json!({
        "queueSize": snapshot.queue.len(),
        "processedCount": processed,
        "postedCount": snapshot.posted.len(),
        "dryRun": state.pipeline.is_dry_run(),
        "postTime": state.config.publish.post_time,
        "jobs": state.scheduler.list_jobs(),
    })))
}

/// GET /api/queue
pub async fn list_queue_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let queue = state.pipeline.queue().get_queue().map_err(PipelineError::from)?;
    Ok(Json(json!(queue)))
}

/// GET /api/posted
pub async fn list_posted_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let posted = state.pipeline.queue().get_posted().map_err(PipelineError::from)?;
    Ok(Json(json!(posted)))
}

/// POST /api/queue: `{ "text": "..." }`, appended at the tail.
pub async fn add_handler(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult {
    let item = state.pipeline.add_manual(text_field(&body))?;
    info!(item_id = %item.id, "manual item added");
    Ok(Json(json!({
        "success": true,
        "message": "Post added to queue",
        "item": item,
    })))
}

/// PUT /api/queue/{id}: replace the text, keeping the position.
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    if !state.pipeline.edit_text(&id, text_field(&body))? {
        return Err(failure(StatusCode::NOT_FOUND, "Post not found in queue"));
    }
    Ok(Json(json!({ "success": true, "message": "Post updated successfully" })))
}

/// DELETE /api/queue/{id}
pub async fn delete_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    let removed = state
        .pipeline
        .queue()
        .delete_queue_item(&id)
        .map_err(PipelineError::from)?;
    if !removed {
        return Err(failure(StatusCode::NOT_FOUND, "Post not found in queue"));
    }
    info!(item_id = %id, "queue item deleted");
    Ok(Json(json!({ "success": true, "message": "Post deleted successfully" })))
}
