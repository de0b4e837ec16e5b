//! In-app notifications, re-exported from the models crate.

pub use cuaderno_models::notifications::*;
pub use cuaderno_models::{NotificationId, UserId};
