//! Shared utilities.
//!
//! - [`email`]: Notification emails over SMTP

pub mod email;
