// libs/messaging-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::{self, MessagingState};

pub fn messaging_routes(state: Arc<MessagingState>) -> Router {
    Router::new()
        .route("/sms", post(handlers::inbound_sms))
        .with_state(state)
}
