//! Notification broker selection.
//!
//! - `NOTIFICATIONS_BROKER`: `memory` (default), `redis` or `disabled`
//! - `REDIS_URL`: Redis connection string for the `redis` broker
//! - `NOTIFICATIONS_EXCHANGE`: Topic exchange name (default: `cuaderno.notifications`)
//! - `NOTIFICATIONS_QUEUE_CAPACITY`: Buffer size per in-memory subscription (default: 1024)

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::env_or;

pub const DEFAULT_EXCHANGE: &str = "cuaderno.notifications";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrokerKind {
    Memory,
    Redis,
    Disabled,
}

impl FromStr for BrokerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(format!("Unknown notification broker: {other}")),
        }
    }
}

impl fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub kind: BrokerKind,
    pub redis_url: String,
    pub exchange: String,
    pub queue_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            kind: BrokerKind::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
            queue_capacity: 1024,
        }
    }
}

impl BrokerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            kind: env_or("NOTIFICATIONS_BROKER", defaults.kind),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            exchange: env::var("NOTIFICATIONS_EXCHANGE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.exchange),
            queue_capacity: env_or("NOTIFICATIONS_QUEUE_CAPACITY", defaults.queue_capacity)
                .max(1),
        }
    }

    pub fn disabled() -> Self {
        Self {
            kind: BrokerKind::Disabled,
            ..Self::default()
        }
    }
}
