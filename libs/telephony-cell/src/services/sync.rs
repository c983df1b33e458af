// libs/telephony-cell/src/services/sync.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{debug, info};

use calendar_cell::store::CalendarStore;

use crate::models::{DailyAnalytics, Direction, TelephonyError};
use crate::services::client::TelephonyProvider;
use crate::services::scheduler::JobScheduler;
use crate::store::CallLogStore;

pub const CALL_SYNC_JOB: &str = "call-sync";
pub const SMS_CHECK_JOB: &str = "sms-check";
pub const DAILY_ANALYTICS_JOB: &str = "daily-analytics";

const CALL_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);
const SMS_CHECK_INTERVAL: Duration = Duration::from_secs(15 * 60);
const DAILY_ANALYTICS_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Pulls call/SMS history from the provider and keeps the local mirrors
/// and the daily rollup current. Every write is idempotent, so a rerun
/// over the same window is harmless.
pub struct TelephonySyncService {
    provider: Arc<dyn TelephonyProvider>,
    store: Arc<dyn CallLogStore>,
    calendar: Arc<dyn CalendarStore>,
    did: String,
}

impl TelephonySyncService {
    pub fn new(
        provider: Arc<dyn TelephonyProvider>,
        store: Arc<dyn CallLogStore>,
        calendar: Arc<dyn CalendarStore>,
        did: String,
    ) -> Self {
        Self {
            provider,
            store,
            calendar,
            did,
        }
    }

    /// Register the three recurring jobs. Each one catches its own errors;
    /// a failed run waits for the next tick.
    pub fn start_jobs(self: &Arc<Self>, scheduler: &JobScheduler) {
        let sync = Arc::clone(self);
        scheduler.schedule_job(CALL_SYNC_JOB, CALL_SYNC_INTERVAL, move || {
            let sync = Arc::clone(&sync);
            async move { sync.sync_call_history().await.map(|_| ()) }
        });

        let sync = Arc::clone(self);
        scheduler.schedule_job(SMS_CHECK_JOB, SMS_CHECK_INTERVAL, move || {
            let sync = Arc::clone(&sync);
            async move { sync.check_inbound_messages().await.map(|_| ()) }
        });

        let sync = Arc::clone(self);
        scheduler.schedule_job(DAILY_ANALYTICS_JOB, DAILY_ANALYTICS_INTERVAL, move || {
            let sync = Arc::clone(&sync);
            async move { sync.run_daily_analytics().await.map(|_| ()) }
        });
    }

    /// Pull the trailing 24 hours of call records and upsert them keyed by
    /// the provider call id. Returns how many records the provider handed
    /// back.
    pub async fn sync_call_history(&self) -> Result<usize, TelephonyError> {
        let to = Utc::now();
        let from = to - ChronoDuration::hours(24);

        let calls = self.provider.list_calls(from, to).await?;
        let count = calls.len();

        for call in calls {
            self.store.upsert_call(call).await?;
        }

        info!("Synced {} call records", count);
        Ok(count)
    }

    /// Pull the trailing 24 hours of messages to the practice number and
    /// insert the inbound ones we have not seen. Message ids are
    /// provider-assigned, so an existence check before insert is enough
    /// inside a single scheduler.
    pub async fn check_inbound_messages(&self) -> Result<usize, TelephonyError> {
        let to = Utc::now();
        let from = to - ChronoDuration::hours(24);

        let messages = self.provider.list_messages(&self.did, from, to).await?;
        let mut inserted = 0;

        for message in messages {
            if message.direction != Direction::Inbound {
                continue;
            }
            if self.store.sms_exists(&message.message_sid).await? {
                debug!("SMS {} already stored, skipping", message.message_sid);
                continue;
            }
            self.store.insert_sms(message).await?;
            inserted += 1;
        }

        info!("Stored {} new inbound messages", inserted);
        Ok(inserted)
    }

    /// Roll up the previous calendar day. Purely derived from the local
    /// stores; recomputing overwrites the existing row.
    pub async fn run_daily_analytics(&self) -> Result<DailyAnalytics, TelephonyError> {
        let yesterday = (Utc::now() - ChronoDuration::days(1)).date_naive();

        let call_count = self.store.count_calls_on(yesterday).await?;
        let appointment_count = self
            .calendar
            .count_appointments_on(yesterday)
            .await
            .map_err(|e| TelephonyError::Database(e.to_string()))?;

        let summary = DailyAnalytics {
            date: yesterday,
            call_count,
            appointment_count,
        };

        self.store.upsert_daily_analytics(summary.clone()).await?;

        info!(
            "Daily analytics for {}: {} calls, {} appointments",
            summary.date, summary.call_count, summary.appointment_count
        );
        Ok(summary)
    }
}
