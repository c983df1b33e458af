// libs/messaging-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::error;

use shared_models::error::AppError;

use crate::models::MessagingError;
use crate::services::interpreter::SmsCommandService;

pub struct MessagingState {
    pub commands: SmsCommandService,
}

/// Form-encoded webhook payload from the telephony provider. Only the
/// sender and the body matter to the core; anything else is ignored.
#[derive(Debug, Deserialize)]
pub struct InboundSmsForm {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// The provider expects an empty 200 once the message is handled, and a
/// 5xx (which it retries) only when we could not process it at all. The
/// reply itself goes out through the send API, not this response.
#[axum::debug_handler]
pub async fn inbound_sms(
    State(state): State<Arc<MessagingState>>,
    Form(payload): Form<InboundSmsForm>,
) -> Result<StatusCode, AppError> {
    state
        .commands
        .handle_inbound(&payload.from, &payload.body)
        .await
        .map(|_| StatusCode::OK)
        .map_err(|e| {
            error!("Webhook error: {}", e);
            match e {
                MessagingError::Store(msg) => AppError::Database(msg),
                MessagingError::Calendar(err) => AppError::Database(err.to_string()),
            }
        })
}
