// libs/telephony-cell/src/store/mod.rs
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{CallRecord, DailyAnalytics, SmsRecord, TelephonyError};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryCallLogStore;
pub use supabase::SupabaseCallLogStore;

/// Persistence for the telephony mirrors and the daily rollup. The sync
/// jobs are the only writers; nothing else touches these tables.
#[async_trait]
pub trait CallLogStore: Send + Sync {
    /// Insert-or-update keyed by `call_sid`. Applying the same record twice
    /// leaves one row.
    async fn upsert_call(&self, record: CallRecord) -> Result<(), TelephonyError>;

    async fn sms_exists(&self, message_sid: &str) -> Result<bool, TelephonyError>;

    async fn insert_sms(&self, record: SmsRecord) -> Result<(), TelephonyError>;

    async fn count_calls_on(&self, date: NaiveDate) -> Result<i64, TelephonyError>;

    /// Overwrite the rollup for the summary's date.
    async fn upsert_daily_analytics(&self, summary: DailyAnalytics) -> Result<(), TelephonyError>;
}
