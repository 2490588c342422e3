pub mod health;
pub mod publish;
pub mod pull;
pub mod queue;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::error;

use crate::error::PipelineError;

/// Error half of every API handler: a status plus a `{ success: false, ... }` body.
pub type ApiError = (StatusCode, Json<Value>);

pub type ApiResult = Result<Json<Value>, ApiError>;

pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
}

/// Map a pipeline error onto a response. Blank text is the caller's fault;
/// everything else is a 500 carrying the error code.
pub fn pipeline_failure(e: PipelineError) -> ApiError {
    if let PipelineError::BlankText = e {
        return failure(StatusCode::BAD_REQUEST, "Post text is required");
    }
    error!(error = %e, code = e.code(), "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": e.to_string(),
            "code": e.code(),
        })),
    )
}

impl From<PipelineError> for (StatusCode, Json<Value>) {
    fn from(e: PipelineError) -> Self {
        pipeline_failure(e)
    }
}
