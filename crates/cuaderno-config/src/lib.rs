//! # Cuaderno Config
//!
//! Configuration types for the Cuaderno API, loaded from environment variables.
//!
//! - [`jwt`]: JWT authentication configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`email`]: Email/SMTP configuration
//! - [`rate_limit`]: Rate limiting for authentication endpoints
//! - [`broker`]: Notification message broker selection
//! - [`server`]: Listener address
//!
//! # Example
//!
//! ```ignore
//! use cuaderno_config::{BrokerConfig, JwtConfig, CorsConfig, EmailConfig, RateLimitConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let email_config = EmailConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! let broker_config = BrokerConfig::from_env();
//! ```

pub mod broker;
pub mod cors;
pub mod email;
pub mod jwt;
pub mod rate_limit;
pub mod server;

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| {
            let v = v.trim().to_lowercase();
            v == "true" || v == "1" || v == "yes"
        })
        .unwrap_or(default)
}

// Re-export commonly used types at crate root
pub use broker::{BrokerConfig, BrokerKind};
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
