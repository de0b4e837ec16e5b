use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use cuaderno_core::serde::deserialize_optional;
use cuaderno_core::{PaginationMeta, PaginationParams};

use crate::ids::{NotificationId, UserId};

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationKind {
    Schedule,
    Content,
    Evaluation,
    Grade,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Schedule => "schedule",
            NotificationKind::Content => "content",
            NotificationKind::Evaluation => "evaluation",
            NotificationKind::Grade => "grade",
            NotificationKind::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "schedule" => Ok(NotificationKind::Schedule),
            "content" => Ok(NotificationKind::Content),
            "evaluation" => Ok(NotificationKind::Evaluation),
            "grade" => Ok(NotificationKind::Grade),
            "system" => Ok(NotificationKind::System),
            other => Err(format!("Invalid notification kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationFilterParams {
    /// `true` for unread only, `false` for read only
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub unread: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub kind: Option<NotificationKind>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedNotificationsResponse {
    pub data: Vec<Notification>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}
