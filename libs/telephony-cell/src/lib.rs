pub mod models;
pub mod store;
pub mod services;

pub use models::*;
pub use store::{CallLogStore, InMemoryCallLogStore, SupabaseCallLogStore};
pub use services::client::{TelephonyProvider, VoipMsClient};
pub use services::scheduler::{JobScheduler, JobStatus};
pub use services::sync::TelephonySyncService;
