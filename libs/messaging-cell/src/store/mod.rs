// libs/messaging-cell/src/store/mod.rs
use async_trait::async_trait;

use crate::models::{MessagingError, SmsInteraction};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryInteractionStore;
pub use supabase::SupabaseInteractionStore;

/// Append-only log of inbound SMS handling. The command interpreter is the
/// only writer.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn record(&self, interaction: SmsInteraction) -> Result<(), MessagingError>;
}
