use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use dripfeed_core::DripfeedConfig;
use dripfeed_scheduler::SchedulerHandle;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::pipeline::Pipeline;

/// Central shared state: passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: DripfeedConfig,
    pub pipeline: Arc<Pipeline>,
    pub scheduler: SchedulerHandle,
}

impl AppState {
    pub fn new(config: DripfeedConfig, pipeline: Arc<Pipeline>, scheduler: SchedulerHandle) -> Self {
        Self {
            config,
            pipeline,
            scheduler,
        }
    }
}

/// Assemble the full Axum router.
///
/// Every route, the static dashboard included, sits behind the Basic auth
/// layer; it is a no-op when no dashboard password is configured.
pub fn build_router(state: Arc<AppState>) -> Router {
    use crate::http::{health, publish, pull, queue};

    let dashboard = ServeDir::new(&state.config.paths.public_dir);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/status", get(queue::status_handler))
        .route(
            "/api/queue",
            get(queue::list_queue_handler).post(queue::add_handler),
        )
        .route(
            "/api/queue/{id}",
            put(queue::update_handler).delete(queue::delete_handler),
        )
        .route("/api/posted", get(queue::list_posted_handler))
        .route("/api/pull-notion", post(pull::pull_tracker_handler))
        .route("/api/pull-file", post(pull::pull_file_handler))
        .route("/api/post-next", post(publish::post_next_handler))
        .fallback_service(dashboard)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
