//! In-process topic exchange.
//!
//! Each subscription owns a bounded `mpsc` queue. Publishing copies the
//! payload into every queue whose pattern matches the routing key and never
//! waits: when a queue is full the message is dropped for that subscriber.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::message::Delivery;
use super::topic::topic_matches;

struct Subscription {
    pattern: String,
    tx: mpsc::Sender<Delivery>,
}

#[derive(Clone)]
pub struct InMemoryBroker {
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
    capacity: usize,
}

impl std::fmt::Debug for InMemoryBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBroker")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl InMemoryBroker {
    /// Creates a broker whose subscription queues hold `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            capacity: capacity.max(1),
        }
    }

    /// Binds a new queue to `pattern` and returns its receiving end.
    pub fn subscribe(&self, pattern: &str) -> mpsc::Receiver<Delivery> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.lock().push(Subscription {
            pattern: pattern.to_string(),
            tx,
        });
        debug!(pattern = %pattern, "In-memory subscription added");
        rx
    }

    /// Routes `payload` to every matching subscription.
    ///
    /// Returns the number of queues that accepted the message. Subscriptions
    /// whose receiver was dropped are removed.
    pub fn publish(&self, routing_key: &str, payload: Vec<u8>) -> usize {
        let mut subscriptions = self.lock();
        subscriptions.retain(|s| !s.tx.is_closed());

        let mut delivered = 0;
        for subscription in subscriptions
            .iter()
            .filter(|s| topic_matches(&s.pattern, routing_key))
        {
            let delivery = Delivery {
                routing_key: routing_key.to_string(),
                payload: payload.clone(),
            };

            match subscription.tx.try_send(delivery) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        pattern = %subscription.pattern,
                        routing_key = %routing_key,
                        "Subscription queue full, message dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_by_pattern() {
        let broker = InMemoryBroker::new(8);
        let mut users = broker.subscribe("user.*");
        let mut everything = broker.subscribe("#");

        assert_eq!(broker.publish("user.3", b"a".to_vec()), 2);
        assert_eq!(broker.publish("subject.9", b"b".to_vec()), 1);

        let first = users.recv().await.unwrap();
        assert_eq!(first.routing_key, "user.3");
        assert_eq!(first.payload, b"a");
        assert!(users.try_recv().is_err());

        assert_eq!(everything.recv().await.unwrap().routing_key, "user.3");
        assert_eq!(everything.recv().await.unwrap().routing_key, "subject.9");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let broker = InMemoryBroker::new(4);
        assert_eq!(broker.publish("user.1", b"x".to_vec()), 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let broker = InMemoryBroker::new(1);
        let mut rx = broker.subscribe("user.*");

        assert_eq!(broker.publish("user.1", b"first".to_vec()), 1);
        assert_eq!(broker.publish("user.1", b"second".to_vec()), 0);

        assert_eq!(rx.recv().await.unwrap().payload, b"first");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_subscriptions_are_pruned() {
        let broker = InMemoryBroker::new(4);
        let rx = broker.subscribe("user.*");
        assert_eq!(broker.subscriber_count(), 1);

        drop(rx);
        assert_eq!(broker.publish("user.1", b"x".to_vec()), 0);
        assert_eq!(broker.subscriber_count(), 0);
    }
}
