use axum::{extract::State, Json};
use serde_json::json;
use std::sync::Arc;

use super::ApiResult;
use crate::app::AppState;

/// POST /api/pull-notion: enqueue newly done tracker items.
pub async fn pull_tracker_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let report = state.pipeline.pull_tracker().await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Added {} new item(s) to queue", report.added),
        "newItems": report.added,
        "queueSize": report.queue_size,
    })))
}

/// POST /api/pull-file: enqueue lines appended to the lines file.
pub async fn pull_file_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let report = state.pipeline.pull_file().await?;
    let message = if report.added == 0 {
        "No new lines in file".to_string()
    } else {
        format!("Added {} new post(s) to queue", report.added)
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "added": report.added,
        "queueSize": report.queue_size,
    })))
}
