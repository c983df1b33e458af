// libs/telephony-cell/src/services/client.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{CallRecord, Direction, SmsRecord, TelephonyError};

const DEFAULT_API_URL: &str = "https://voip.ms/api/v1/rest.php";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Outbound port to the telephony provider: history pulls for the sync
/// jobs and the send API for SMS replies.
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Call detail records inside the window, normalized.
    async fn list_calls(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CallRecord>, TelephonyError>;

    /// SMS traffic on the given practice number inside the window.
    async fn list_messages(
        &self,
        to_number: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SmsRecord>, TelephonyError>;

    /// Send a message from the practice number; returns the provider's
    /// message id.
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, TelephonyError>;
}

/// VoIP.ms REST client. Every method call is one GET against rest.php with
/// the method name and credentials in the query string.
pub struct VoipMsClient {
    client: Client,
    api_url: String,
    username: String,
    password: String,
    did: String,
}

impl VoipMsClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_api_url(config, DEFAULT_API_URL)
    }

    /// Point the client somewhere else; the test suites aim it at a mock
    /// server.
    pub fn with_api_url(config: &AppConfig, api_url: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: api_url.to_string(),
            username: config.voipms_username.clone(),
            password: config.voipms_password.clone(),
            did: config.voipms_did.clone(),
        }
    }

    async fn make_request(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<Value, TelephonyError> {
        let mut query: Vec<(&str, String)> = vec![
            ("api_username", self.username.clone()),
            ("api_password", self.password.clone()),
            ("method", method.to_string()),
        ];
        query.extend_from_slice(params);

        debug!("Calling provider method {}", method);
        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await?
            .json::<Value>()
            .await?;

        let status = response["status"].as_str().unwrap_or("unknown");
        if status != "success" {
            error!("Provider API error for {}: {}", method, status);
            return Err(TelephonyError::Provider(format!(
                "provider API error: {}",
                status
            )));
        }

        Ok(response)
    }

    /// Map the provider's call disposition onto our status vocabulary.
    fn map_call_status(disposition: &str) -> &'static str {
        match disposition.to_lowercase().as_str() {
            "answered" => "completed",
            "busy" => "busy",
            "noanswer" => "no-answer",
            "failed" => "failed",
            "cancel" => "canceled",
            _ => "completed",
        }
    }

    fn parse_provider_timestamp(raw: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map(|dt| dt.and_utc())
            .unwrap_or_else(|_| Utc::now())
    }
}

#[async_trait]
impl TelephonyProvider for VoipMsClient {
    async fn list_calls(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CallRecord>, TelephonyError> {
        let response = self
            .make_request(
                "getCDR",
                &[
                    ("date_from", from.format("%Y-%m-%d").to_string()),
                    ("date_to", to.format("%Y-%m-%d").to_string()),
                    ("timezone", "0".to_string()),
                    ("calltype", "all".to_string()),
                ],
            )
            .await?;

        let rows = response["cdr"].as_array().cloned().unwrap_or_default();

        let records = rows
            .iter()
            .map(|row| {
                let disposition = row["disposition"].as_str().unwrap_or("");
                let seconds = row["seconds"]
                    .as_str()
                    .and_then(|s| s.parse::<i64>().ok())
                    .or_else(|| row["seconds"].as_i64())
                    .unwrap_or(0);

                CallRecord {
                    call_sid: row["uniqueid"].as_str().unwrap_or_default().to_string(),
                    from_number: row["callerid"].as_str().unwrap_or_default().to_string(),
                    to_number: row["destination"].as_str().unwrap_or_default().to_string(),
                    direction: if disposition.eq_ignore_ascii_case("inbound") {
                        Direction::Inbound
                    } else {
                        Direction::Outbound
                    },
                    status: Self::map_call_status(disposition).to_string(),
                    duration_seconds: seconds,
                    started_at: Self::parse_provider_timestamp(
                        row["date"].as_str().unwrap_or_default(),
                    ),
                }
            })
            .filter(|r| !r.call_sid.is_empty())
            .collect();

        Ok(records)
    }

    async fn list_messages(
        &self,
        to_number: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SmsRecord>, TelephonyError> {
        let response = self
            .make_request(
                "getSMS",
                &[
                    ("did", to_number.to_string()),
                    ("from", from.format("%Y-%m-%d").to_string()),
                    ("to", to.format("%Y-%m-%d").to_string()),
                    ("limit", "100".to_string()),
                ],
            )
            .await?;

        let rows = response["sms"].as_array().cloned().unwrap_or_default();

        let records = rows
            .iter()
            .map(|row| {
                let direction = if row["direction"].as_str().unwrap_or("") == "in" {
                    Direction::Inbound
                } else {
                    Direction::Outbound
                };

                SmsRecord {
                    message_sid: row["id"].as_str().map(str::to_string).unwrap_or_else(|| {
                        row["id"].as_i64().map(|v| v.to_string()).unwrap_or_default()
                    }),
                    from_number: row["from"].as_str().unwrap_or_default().to_string(),
                    to_number: to_number.to_string(),
                    direction,
                    status: if direction == Direction::Inbound {
                        "received".to_string()
                    } else {
                        "sent".to_string()
                    },
                    body: row["message"].as_str().unwrap_or_default().to_string(),
                    received_at: Self::parse_provider_timestamp(
                        row["date"].as_str().unwrap_or_default(),
                    ),
                }
            })
            .filter(|r| !r.message_sid.is_empty())
            .collect();

        Ok(records)
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<String, TelephonyError> {
        let response = self
            .make_request(
                "sendSMS",
                &[
                    ("did", self.did.clone()),
                    ("dst", to.to_string()),
                    ("message", body.to_string()),
                ],
            )
            .await?;

        let sid = response["sms_id"]
            .as_str()
            .map(str::to_string)
            .or_else(|| response["sms_id"].as_i64().map(|v| v.to_string()))
            .unwrap_or_default();

        debug!("Sent SMS to {} (sid {})", to, sid);
        Ok(sid)
    }
}
