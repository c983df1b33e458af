pub mod models;
pub mod store;
pub mod services;

pub use models::*;
pub use store::{CalendarStore, InMemoryCalendarStore, SupabaseCalendarStore};
pub use services::booking::SlotBookingService;
pub use services::lifecycle::AppointmentLifecycleService;
