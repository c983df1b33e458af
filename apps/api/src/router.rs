use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use messaging_cell::handlers::MessagingState;
use messaging_cell::router::messaging_routes;
use telephony_cell::services::scheduler::JobScheduler;

pub fn create_router(messaging: Arc<MessagingState>, scheduler: Arc<JobScheduler>) -> Router {
    Router::new()
        .route("/", get(|| async { "Practice API is running!" }))
        .route("/jobs/status", get(jobs_status))
        .with_state(scheduler)
        .nest("/webhooks", messaging_routes(messaging))
}

async fn jobs_status(State(scheduler): State<Arc<JobScheduler>>) -> Json<Value> {
    Json(json!({ "jobs": scheduler.status() }))
}
