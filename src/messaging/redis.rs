//! Redis pub/sub transport.
//!
//! A message with routing key `user.7` is published on channel
//! `<exchange>.user.7`. Subscribers `PSUBSCRIBE <exchange>.*`, strip the
//! exchange prefix and apply topic matching locally, so `*` and `#` keep
//! their word semantics instead of Redis glob semantics.

use futures::StreamExt;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::error::BusError;
use super::message::Delivery;
use super::topic::topic_matches;

#[derive(Clone)]
pub struct RedisBroker {
    client: Client,
    conn: ConnectionManager,
    exchange: String,
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker")
            .field("exchange", &self.exchange)
            .finish_non_exhaustive()
    }
}

impl RedisBroker {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Redis` if the URL is invalid or the server is unreachable.
    pub async fn connect(redis_url: &str, exchange: &str) -> Result<Self, BusError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client.clone()).await?;

        info!(exchange = %exchange, "Connected to Redis notification broker");

        Ok(Self {
            client,
            conn,
            exchange: exchange.to_string(),
        })
    }

    fn channel_for(&self, routing_key: &str) -> String {
        format!("{}.{}", self.exchange, routing_key)
    }

    /// Publishes `payload` and returns the number of Redis subscribers that received it.
    #[instrument(skip(self, payload), fields(bus.operation = "PUBLISH"))]
    pub async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<usize, BusError> {
        let mut conn = self.conn.clone();
        let receivers: usize = conn.publish(self.channel_for(routing_key), payload).await?;
        debug!(routing_key = %routing_key, receivers, "Published to Redis");
        Ok(receivers)
    }

    /// Opens a dedicated pub/sub connection and forwards every message whose
    /// routing key matches `pattern` into a bounded queue.
    pub async fn subscribe(
        &self,
        pattern: &str,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Delivery>, BusError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.psubscribe(format!("{}.*", self.exchange)).await?;

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let prefix = format!("{}.", self.exchange);
        let pattern = pattern.to_string();

        tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(msg) = messages.next().await {
                let Some(routing_key) = msg.get_channel_name().strip_prefix(&prefix) else {
                    continue;
                };
                if !topic_matches(&pattern, routing_key) {
                    continue;
                }

                let delivery = Delivery {
                    routing_key: routing_key.to_string(),
                    payload: msg.get_payload_bytes().to_vec(),
                };
                if tx.send(delivery).await.is_err() {
                    break;
                }
            }
            warn!(pattern = %pattern, "Redis notification subscription closed");
        });

        info!(exchange = %self.exchange, "Subscribed to Redis notification channels");

        Ok(rx)
    }
}
