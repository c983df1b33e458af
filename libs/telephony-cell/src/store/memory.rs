// libs/telephony-cell/src/store/memory.rs
//
// In-memory mirror store for the test suites. Keyed maps give the same
// no-duplicates behavior the unique columns give the production store.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{CallRecord, DailyAnalytics, SmsRecord, TelephonyError};
use crate::store::CallLogStore;

#[derive(Default)]
struct Inner {
    calls: HashMap<String, CallRecord>,
    sms: HashMap<String, SmsRecord>,
    analytics: HashMap<NaiveDate, DailyAnalytics>,
}

#[derive(Default)]
pub struct InMemoryCallLogStore {
    inner: Mutex<Inner>,
}

impl InMemoryCallLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().expect("call log lock poisoned").calls.len()
    }

    pub fn sms_count(&self) -> usize {
        self.inner.lock().expect("call log lock poisoned").sms.len()
    }

    pub fn analytics_for(&self, date: NaiveDate) -> Option<DailyAnalytics> {
        self.inner
            .lock()
            .expect("call log lock poisoned")
            .analytics
            .get(&date)
            .cloned()
    }
}

#[async_trait]
impl CallLogStore for InMemoryCallLogStore {
    async fn upsert_call(&self, record: CallRecord) -> Result<(), TelephonyError> {
        let mut inner = self.inner.lock().expect("call log lock poisoned");
        inner.calls.insert(record.call_sid.clone(), record);
        Ok(())
    }

    async fn sms_exists(&self, message_sid: &str) -> Result<bool, TelephonyError> {
        let inner = self.inner.lock().expect("call log lock poisoned");
        Ok(inner.sms.contains_key(message_sid))
    }

    async fn insert_sms(&self, record: SmsRecord) -> Result<(), TelephonyError> {
        let mut inner = self.inner.lock().expect("call log lock poisoned");
        inner.sms.insert(record.message_sid.clone(), record);
        Ok(())
    }

    async fn count_calls_on(&self, date: NaiveDate) -> Result<i64, TelephonyError> {
        let inner = self.inner.lock().expect("call log lock poisoned");
        Ok(inner
            .calls
            .values()
            .filter(|c| c.started_at.date_naive() == date)
            .count() as i64)
    }

    async fn upsert_daily_analytics(&self, summary: DailyAnalytics) -> Result<(), TelephonyError> {
        let mut inner = self.inner.lock().expect("call log lock poisoned");
        inner.analytics.insert(summary.date, summary);
        Ok(())
    }
}
