use std::env;

use crate::{env_flag, env_or};

/// SMTP settings used by the notification worker.
///
/// Email delivery is off unless `SMTP_ENABLED` is `true`/`1`.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub frontend_url: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_flag("SMTP_ENABLED", false),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: env_or("SMTP_PORT", 1025),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@cuaderno.local".to_string()),
            from_name: env::var("FROM_NAME").unwrap_or_else(|_| "Cuaderno".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }

    /// Configuration with delivery turned off, used by tests and tooling.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@cuaderno.local".to_string(),
            from_name: "Cuaderno".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}
