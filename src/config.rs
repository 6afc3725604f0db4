use serde::Deserialize;
use std::env;

pub const DEFAULT_DAILY_LIMIT: i64 = 50;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub sender_name: String,
    pub sender_email: String,
    /// HELO identity announced during verification probes.
    pub probe_helo: String,
    /// Envelope sender used for MAIL FROM during verification probes.
    pub probe_mail_from: String,
    pub default_daily_limit: i64,
    pub settings_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        let smtp_username = env::var("SMTP_USER").unwrap_or_default();
        let sender_email = env::var("SENDER_EMAIL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| smtp_username.clone());

        Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/mailing.db".into()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3001".into()),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into()),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(587),
            smtp_username,
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            sender_name: env::var("SENDER_NAME").unwrap_or_else(|_| "OpenMailer".into()),
            sender_email,
            probe_helo: env::var("PROBE_HELO").unwrap_or_else(|_| "openmailer.local".into()),
            probe_mail_from: env::var("PROBE_MAIL_FROM")
                .unwrap_or_else(|_| "verify@openmailer.local".into()),
            default_daily_limit: env::var("DAILY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DAILY_LIMIT),
            settings_path: env::var("SETTINGS_PATH")
                .unwrap_or_else(|_| "data/settings.json".into()),
        }
    }
}
