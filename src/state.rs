use cuaderno_config::{CorsConfig, EmailConfig, JwtConfig, RateLimitConfig};
use cuaderno_db::SqlitePool;

use crate::messaging::NotificationPublisher;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub notifier: NotificationPublisher,
}

impl AppState {
    /// Builds the state from the environment around an open pool and a
    /// connected notification publisher.
    pub fn from_env(db: SqlitePool, notifier: NotificationPublisher) -> Self {
        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            email_config: EmailConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
            notifier,
        }
    }
}
