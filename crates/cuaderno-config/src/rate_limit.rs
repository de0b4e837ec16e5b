//! Rate limiting configuration for the authentication endpoints.
//!
//! Login, registration and token refresh are throttled per client IP with a
//! token bucket from the Governor crate:
//!
//! - Tokens are added at the configured rate (per second)
//! - Each request consumes one token
//! - Burst size defines the maximum tokens that can accumulate
//!
//! # Configuration
//!
//! - `RATE_LIMIT_ENABLED`: Turn the limiter on or off (default: true)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: Token replenishment rate (default: 10)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: Burst size (default: 5)

use governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

use crate::{env_flag, env_or};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests per second for auth endpoints.
    pub auth_per_second: u64,
    /// Maximum number of tokens that can accumulate.
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Builds the Governor configuration for the auth routes.
    ///
    /// The key is the client IP taken from `x-forwarded-for`, `x-real-ip` or
    /// `forwarded`, falling back to the peer address. Returns `None` when the
    /// limiter is disabled or the configured values are zero.
    #[must_use]
    pub fn auth_governor_config(
        &self,
    ) -> Option<GovernorConfig<SmartIpKeyExtractor, NoOpMiddleware>> {
        if !self.enabled {
            return None;
        }

        GovernorConfigBuilder::default()
            .per_second(self.auth_per_second)
            .burst_size(self.auth_burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
    }
}
