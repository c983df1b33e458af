// libs/messaging-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::supabase::SupabaseClient;

use crate::models::{MessagingError, SmsInteraction};
use crate::store::InteractionStore;

pub struct SupabaseInteractionStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseInteractionStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl InteractionStore for SupabaseInteractionStore {
    async fn record(&self, interaction: SmsInteraction) -> Result<(), MessagingError> {
        debug!("Recording SMS interaction for {}", interaction.phone);

        let body = json!({
            "phone": interaction.phone,
            "incoming_message": interaction.incoming_message,
            "outgoing_message": interaction.outgoing_message,
            "action_taken": interaction.action_taken.to_string(),
            "created_at": interaction.created_at.to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        self.supabase
            .request_with_headers::<Vec<Value>>(
                Method::POST,
                "/rest/v1/sms_interactions",
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| MessagingError::Store(e.to_string()))?;

        Ok(())
    }
}
