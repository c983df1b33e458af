pub mod models;
pub mod store;
pub mod services;
pub mod handlers;
pub mod router;

pub use models::*;
pub use store::{InMemoryInteractionStore, InteractionStore, SupabaseInteractionStore};
pub use services::interpreter::SmsCommandService;
pub use router::messaging_routes;
