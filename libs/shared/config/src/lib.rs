use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub voipms_username: String,
    pub voipms_password: String,
    pub voipms_did: String,
    pub practice_phone_display: String,
    pub practice_booking_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            voipms_username: env::var("VOIPMS_USERNAME")
                .unwrap_or_else(|_| {
                    warn!("VOIPMS_USERNAME not set, using empty value");
                    String::new()
                }),
            voipms_password: env::var("VOIPMS_PASSWORD")
                .unwrap_or_else(|_| {
                    warn!("VOIPMS_PASSWORD not set, using empty value");
                    String::new()
                }),
            voipms_did: env::var("VOIPMS_DID")
                .unwrap_or_else(|_| {
                    warn!("VOIPMS_DID not set, using empty value");
                    String::new()
                }),
            practice_phone_display: env::var("PRACTICE_PHONE_DISPLAY")
                .unwrap_or_else(|_| "(929) 242-4535".to_string()),
            practice_booking_url: env::var("PRACTICE_BOOKING_URL")
                .unwrap_or_else(|_| "gregpedromd.com/booking".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_telephony_configured(&self) -> bool {
        !self.voipms_username.is_empty()
            && !self.voipms_password.is_empty()
            && !self.voipms_did.is_empty()
    }
}
