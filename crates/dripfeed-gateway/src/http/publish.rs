use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

use super::ApiResult;
use crate::app::AppState;
use crate::pipeline::PostOutcome;

/// POST /api/post-next: publish the head of the queue now.
///
/// An empty queue is a 200 with `success: false`; a publisher failure is a
/// 500 and the item is already back at the head.
pub async fn post_next_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    match state.pipeline.post_next().await? {
        PostOutcome::Empty => Ok(Json(json!({
            "success": false,
            "message": "Queue is empty",
        }))),
        PostOutcome::Posted {
            item,
            post_id,
            remaining,
        } => Ok(Json(json!({
            "success": true,
            "message": "Successfully posted!",
            "post": item,
            "postId": post_id,
            "remainingQueue": remaining,
        }))),
        PostOutcome::Failed { item, error } => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Posting failed - item returned to queue",
                "code": error.code(),
                "itemId": item.id,
            })),
        )),
    }
}
