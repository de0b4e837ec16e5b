use tracing::{debug, warn};

use cuaderno_models::UserId;

use super::broker::InMemoryBroker;
use super::error::BusError;
use super::message::NotificationMessage;
use super::redis::RedisBroker;
use crate::metrics::{track_notification_publish_failed, track_notification_published};
use crate::modules::notifications::model::NotificationKind;

#[derive(Clone, Debug)]
enum Transport {
    Memory(InMemoryBroker),
    Redis(RedisBroker),
    Disabled,
}

/// Handle used by services to emit notifications after a write.
///
/// [`publish`](Self::publish) is fire-and-forget: it returns immediately and
/// any failure is only logged and counted.
#[derive(Clone, Debug)]
pub struct NotificationPublisher {
    transport: Transport,
}

impl NotificationPublisher {
    pub fn in_memory(broker: InMemoryBroker) -> Self {
        Self {
            transport: Transport::Memory(broker),
        }
    }

    pub fn redis(broker: RedisBroker) -> Self {
        Self {
            transport: Transport::Redis(broker),
        }
    }

    pub fn disabled() -> Self {
        Self {
            transport: Transport::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.transport, Transport::Disabled)
    }

    /// Serializes `message` and hands it to the transport, returning how many
    /// subscribers received it.
    pub async fn publish_now(&self, message: &NotificationMessage) -> Result<usize, BusError> {
        let payload = serde_json::to_vec(message)?;
        let routing_key = message.routing_key();

        match &self.transport {
            Transport::Memory(broker) => Ok(broker.publish(&routing_key, payload)),
            Transport::Redis(broker) => broker.publish(&routing_key, payload).await,
            Transport::Disabled => Err(BusError::Disabled),
        }
    }

    pub fn publish(&self, message: NotificationMessage) {
        if !self.is_enabled() {
            return;
        }

        let publisher = self.clone();
        tokio::spawn(async move {
            match publisher.publish_now(&message).await {
                Ok(receivers) => {
                    debug!(
                        routing_key = %message.routing_key(),
                        kind = %message.kind,
                        receivers,
                        "Notification published"
                    );
                    track_notification_published(message.kind.as_str());
                }
                Err(e) => {
                    warn!(
                        routing_key = %message.routing_key(),
                        error = %e,
                        "Failed to publish notification"
                    );
                    track_notification_publish_failed(message.kind.as_str());
                }
            }
        });
    }

    /// Publishes the same notification to each user in `user_ids`.
    pub fn notify_users(
        &self,
        user_ids: &[UserId],
        kind: NotificationKind,
        title: &str,
        message: &str,
        send_email: bool,
    ) {
        for &user_id in user_ids {
            self.publish(
                NotificationMessage::new(user_id, kind, title, message).with_email(send_email),
            );
        }
    }
}
