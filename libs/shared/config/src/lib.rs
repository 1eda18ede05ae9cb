use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_anon_key: String,
    pub store_jwt_secret: String,
    pub notify_service_url: String,
    pub notify_api_token: String,
    pub notify_sender: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("TREATWELL_STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("TREATWELL_STORE_URL not set, using empty value");
                    String::new()
                }),
            store_anon_key: env::var("TREATWELL_STORE_ANON_KEY")
                .unwrap_or_else(|_| {
                    warn!("TREATWELL_STORE_ANON_KEY not set, using empty value");
                    String::new()
                }),
            store_jwt_secret: env::var("TREATWELL_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("TREATWELL_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            notify_service_url: env::var("TREATWELL_NOTIFY_URL")
                .unwrap_or_else(|_| {
                    warn!("TREATWELL_NOTIFY_URL not set, meeting emails disabled");
                    String::new()
                }),
            notify_api_token: env::var("TREATWELL_NOTIFY_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("TREATWELL_NOTIFY_API_TOKEN not set, meeting emails disabled");
                    String::new()
                }),
            notify_sender: env::var("TREATWELL_NOTIFY_SENDER")
                .unwrap_or_else(|_| "appointments@treatwell.health".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty()
            && !self.store_anon_key.is_empty()
            && !self.store_jwt_secret.is_empty()
    }

    pub fn is_notifications_configured(&self) -> bool {
        !self.notify_service_url.is_empty() && !self.notify_api_token.is_empty()
    }
}
