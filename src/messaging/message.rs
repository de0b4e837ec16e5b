use serde::{Deserialize, Serialize};

use crate::modules::notifications::model::NotificationKind;
use cuaderno_models::UserId;

/// Binding pattern the notification worker subscribes with.
pub const USER_TOPIC_PATTERN: &str = "user.*";

/// Routing key every notification for `user_id` is published under.
pub fn routing_key_for(user_id: UserId) -> String {
    format!("user.{user_id}")
}

/// Payload published on the notification exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Ask the worker to mail the user as well
    #[serde(default)]
    pub send_email: bool,
}

impl NotificationMessage {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            send_email: false,
        }
    }

    pub fn with_email(mut self, send_email: bool) -> Self {
        self.send_email = send_email;
        self
    }

    pub fn routing_key(&self) -> String {
        routing_key_for(self.user_id)
    }
}

/// A raw message handed to a subscriber by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub routing_key: String,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::topic::topic_matches;

    #[test]
    fn test_routing_key_matches_worker_binding() {
        let msg = NotificationMessage::new(
            UserId::new(31),
            NotificationKind::Grade,
            "Nueva nota",
            "Parcial 1: 8",
        );
        assert_eq!(msg.routing_key(), "user.31");
        assert!(topic_matches(USER_TOPIC_PATTERN, &msg.routing_key()));
    }

    #[test]
    fn test_payload_shape() {
        let msg = NotificationMessage::new(
            UserId::new(4),
            NotificationKind::Content,
            "Nuevo contenido",
            "Semana 3",
        )
        .with_email(true);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["user_id"], 4);
        assert_eq!(json["kind"], "content");
        assert_eq!(json["send_email"], true);
    }

    #[test]
    fn test_send_email_defaults_to_false() {
        let msg: NotificationMessage = serde_json::from_str(
            r#"{"user_id":2,"kind":"system","title":"Hola","message":"Bienvenido"}"#,
        )
        .unwrap();
        assert!(!msg.send_email);
    }
}
