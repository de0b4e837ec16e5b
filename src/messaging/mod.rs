//! Notification fan-out.
//!
//! Services publish a [`NotificationMessage`] per recipient with routing key
//! `user.<id>` after a successful write. The [`NotificationWorker`] is bound
//! to `user.*` and turns each message into a notification row and,
//! optionally, an email.
//!
//! The transport is chosen by [`BrokerConfig`]:
//!
//! - `memory`: [`InMemoryBroker`], bounded queues inside the process
//! - `redis`: [`RedisBroker`], Redis pub/sub on `<exchange>.<routing_key>`
//! - `disabled`: publishing does nothing and no worker runs

pub mod broker;
pub mod error;
pub mod message;
pub mod publisher;
pub mod redis;
pub mod topic;
pub mod worker;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use cuaderno_config::{BrokerConfig, BrokerKind};

pub use self::broker::InMemoryBroker;
pub use self::error::BusError;
pub use self::message::{Delivery, NotificationMessage, USER_TOPIC_PATTERN};
pub use self::publisher::NotificationPublisher;
pub use self::redis::RedisBroker;
pub use self::topic::topic_matches;
pub use self::worker::{DeliveryOutcome, NotificationWorker, SkipReason};

/// A connected transport plus the worker's subscription, not yet consumed.
pub struct NotificationBus {
    publisher: NotificationPublisher,
    subscription: Option<mpsc::Receiver<Delivery>>,
}

impl NotificationBus {
    /// Connects the configured transport and binds the worker queue.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Redis` when the Redis broker is selected and unreachable.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, BusError> {
        let bus = match config.kind {
            BrokerKind::Memory => {
                let broker = InMemoryBroker::new(config.queue_capacity);
                let subscription = broker.subscribe(USER_TOPIC_PATTERN);
                Self {
                    publisher: NotificationPublisher::in_memory(broker),
                    subscription: Some(subscription),
                }
            }
            BrokerKind::Redis => {
                let broker = RedisBroker::connect(&config.redis_url, &config.exchange).await?;
                let subscription = broker
                    .subscribe(USER_TOPIC_PATTERN, config.queue_capacity)
                    .await?;
                Self {
                    publisher: NotificationPublisher::redis(broker),
                    subscription: Some(subscription),
                }
            }
            BrokerKind::Disabled => Self {
                publisher: NotificationPublisher::disabled(),
                subscription: None,
            },
        };

        info!(broker = %config.kind, "Notification bus ready");
        Ok(bus)
    }

    pub fn publisher(&self) -> NotificationPublisher {
        self.publisher.clone()
    }

    /// Starts `worker` on the bus subscription. Returns `None` when the bus is
    /// disabled or a worker was already spawned.
    pub fn spawn_worker(&mut self, worker: NotificationWorker) -> Option<JoinHandle<()>> {
        self.subscription.take().map(|rx| worker.spawn(rx))
    }
}
