//! Notification consumer.
//!
//! For each delivery the worker decodes a [`NotificationMessage`], stores a
//! row in `notifications` and, when the message asks for it, SMTP is enabled
//! and the user has not opted out, sends an email. Malformed payloads and
//! messages for unknown users are logged and skipped.

use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use cuaderno_config::EmailConfig;
use cuaderno_core::AppError;
use cuaderno_models::NotificationId;

use super::message::{Delivery, NotificationMessage};
use crate::metrics::track_notification_delivered;
use crate::modules::notifications::service::NotificationService;
use crate::modules::users::service::UserService;
use crate::utils::email::EmailService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MalformedPayload,
    UnknownUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Stored {
        notification_id: NotificationId,
        emailed: bool,
    },
    Skipped(SkipReason),
}

pub struct NotificationWorker {
    db: SqlitePool,
    email: Option<EmailService>,
}

impl NotificationWorker {
    pub fn new(db: SqlitePool, email_config: EmailConfig) -> Self {
        let email = email_config
            .enabled
            .then(|| EmailService::new(email_config));
        Self { db, email }
    }

    pub fn spawn(self, rx: mpsc::Receiver<Delivery>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    /// Consumes deliveries until every sender is gone.
    pub async fn run(self, mut rx: mpsc::Receiver<Delivery>) {
        info!(email_enabled = self.email.is_some(), "Notification worker started");

        while let Some(delivery) = rx.recv().await {
            if let Err(e) = self.handle(&delivery).await {
                error!(
                    routing_key = %delivery.routing_key,
                    error = %e.error,
                    "Failed to process notification"
                );
            }
        }

        info!("Notification worker stopped");
    }

    #[instrument(skip(self, delivery), fields(routing_key = %delivery.routing_key))]
    pub async fn handle(&self, delivery: &Delivery) -> Result<DeliveryOutcome, AppError> {
        let message: NotificationMessage = match serde_json::from_slice(&delivery.payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Skipping malformed notification payload");
                return Ok(DeliveryOutcome::Skipped(SkipReason::MalformedPayload));
            }
        };

        let Some(user) = UserService::find_user(&self.db, message.user_id).await? else {
            warn!(user_id = %message.user_id, "Skipping notification for unknown user");
            return Ok(DeliveryOutcome::Skipped(SkipReason::UnknownUser));
        };

        let notification = NotificationService::create_notification(
            &self.db,
            user.id,
            message.kind,
            &message.title,
            &message.message,
        )
        .await?;

        let mut emailed = false;
        if message.send_email
            && user.email_notifications
            && let Some(email) = &self.email
        {
            match email
                .send_notification_email(
                    &user.email,
                    &user.full_name(),
                    &message.title,
                    &message.message,
                )
                .await
            {
                Ok(()) => emailed = true,
                Err(e) => warn!(user_id = %user.id, error = %e.error, "Notification email failed"),
            }
        }

        track_notification_delivered(message.kind.as_str(), emailed);

        Ok(DeliveryOutcome::Stored {
            notification_id: notification.id,
            emailed,
        })
    }
}
