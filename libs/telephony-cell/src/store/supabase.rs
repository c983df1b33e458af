// libs/telephony-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::supabase::SupabaseClient;

use crate::models::{CallRecord, DailyAnalytics, SmsRecord, TelephonyError};
use crate::store::CallLogStore;

pub struct SupabaseCallLogStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseCallLogStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// PostgREST upsert headers: merge on the conflict target instead of
    /// failing the insert. Asking for the representation back keeps the
    /// response a JSON body rather than an empty 201.
    fn merge_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );
        headers
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("return=representation"),
        );
        headers
    }
}

#[async_trait]
impl CallLogStore for SupabaseCallLogStore {
    async fn upsert_call(&self, record: CallRecord) -> Result<(), TelephonyError> {
        debug!("Upserting call record {}", record.call_sid);

        let body = json!({
            "call_sid": record.call_sid,
            "from_number": record.from_number,
            "to_number": record.to_number,
            "direction": record.direction.to_string(),
            "status": record.status,
            "duration_seconds": record.duration_seconds,
            "started_at": record.started_at.to_rfc3339(),
        });

        self.supabase
            .request_with_headers::<Vec<Value>>(
                Method::POST,
                "/rest/v1/phone_calls?on_conflict=call_sid",
                Some(body),
                Some(Self::merge_headers()),
            )
            .await
            .map_err(|e| TelephonyError::Database(e.to_string()))?;

        Ok(())
    }

    async fn sms_exists(&self, message_sid: &str) -> Result<bool, TelephonyError> {
        let path = format!(
            "/rest/v1/sms_messages?message_sid=eq.{}&select=message_sid",
            urlencoding::encode(message_sid)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| TelephonyError::Database(e.to_string()))?;

        Ok(!rows.is_empty())
    }

    async fn insert_sms(&self, record: SmsRecord) -> Result<(), TelephonyError> {
        debug!("Storing SMS record {}", record.message_sid);

        let body = json!({
            "message_sid": record.message_sid,
            "from_number": record.from_number,
            "to_number": record.to_number,
            "direction": record.direction.to_string(),
            "status": record.status,
            "body": record.body,
            "received_at": record.received_at.to_rfc3339(),
        });

        self.supabase
            .request_with_headers::<Vec<Value>>(
                Method::POST,
                "/rest/v1/sms_messages",
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| TelephonyError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count_calls_on(&self, date: NaiveDate) -> Result<i64, TelephonyError> {
        let day_start = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TelephonyError::Database("Invalid date".to_string()))?
            .and_utc();
        let day_end = day_start + Duration::days(1);

        let path = format!(
            "/rest/v1/phone_calls?started_at=gte.{}&started_at=lt.{}&select=call_sid",
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339())
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| TelephonyError::Database(e.to_string()))?;

        Ok(rows.len() as i64)
    }

    async fn upsert_daily_analytics(&self, summary: DailyAnalytics) -> Result<(), TelephonyError> {
        let body = json!({
            "date": summary.date.to_string(),
            "call_count": summary.call_count,
            "appointment_count": summary.appointment_count,
        });

        self.supabase
            .request_with_headers::<Vec<Value>>(
                Method::POST,
                "/rest/v1/daily_analytics?on_conflict=date",
                Some(body),
                Some(Self::merge_headers()),
            )
            .await
            .map_err(|e| TelephonyError::Database(e.to_string()))?;

        Ok(())
    }
}
