use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use cuaderno_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

use super::model::{
    MarkAllReadResponse, Notification, NotificationFilterParams, NotificationId,
    PaginatedNotificationsResponse, UnreadCountResponse,
};
use super::service::NotificationService;

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationFilterParams),
    responses(
        (status = 200, description = "Paginated notifications", body = PaginatedNotificationsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<NotificationFilterParams>,
) -> Result<Json<PaginatedNotificationsResponse>, AppError> {
    let notifications =
        NotificationService::get_notifications(&state.db, auth_user.user_id()?, filters).await?;
    Ok(Json(notifications))
}

/// Count of the caller's unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn get_unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let count = NotificationService::unread_count(&state.db, auth_user.user_id()?).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Mark a notification as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>, AppError> {
    let notification = NotificationService::mark_read(&state.db, auth_user.user_id()?, id).await?;
    Ok(Json(notification))
}

/// Mark every notification of the caller as read
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications updated", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = NotificationService::mark_all_read(&state.db, auth_user.user_id()?).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    NotificationService::delete_notification(&state.db, auth_user.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
