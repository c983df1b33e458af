// libs/messaging-cell/src/store/memory.rs
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{MessagingError, SmsInteraction};
use crate::store::InteractionStore;

#[derive(Default)]
pub struct InMemoryInteractionStore {
    interactions: Mutex<Vec<SmsInteraction>>,
}

impl InMemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interactions(&self) -> Vec<SmsInteraction> {
        self.interactions
            .lock()
            .expect("interaction log lock poisoned")
            .clone()
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn record(&self, interaction: SmsInteraction) -> Result<(), MessagingError> {
        self.interactions
            .lock()
            .expect("interaction log lock poisoned")
            .push(interaction);
        Ok(())
    }
}
