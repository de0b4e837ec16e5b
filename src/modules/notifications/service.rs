use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use cuaderno_core::{AppError, PaginationMeta};

use super::model::{
    Notification, NotificationFilterParams, NotificationId, NotificationKind,
    PaginatedNotificationsResponse, UserId,
};

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, is_read, read_at, created_at";

fn not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Notification not found"))
}

fn push_notification_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    user_id: UserId,
    filters: &NotificationFilterParams,
) {
    builder.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(unread) = filters.unread {
        builder.push(" AND is_read = ").push_bind(!unread);
    }
    if let Some(kind) = filters.kind {
        builder.push(" AND kind = ").push_bind(kind);
    }
}

/// Every operation is scoped to the owner; another user's notification
/// behaves as if it did not exist.
pub struct NotificationService;

impl NotificationService {
    #[instrument(skip(db, title, message))]
    pub async fn create_notification(
        db: &SqlitePool,
        user_id: UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (user_id, kind, title, message)
             VALUES (?, ?, ?, ?)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(message)
        .fetch_one(db)
        .await?;

        Ok(notification)
    }

    #[instrument(skip(db))]
    pub async fn get_notifications(
        db: &SqlitePool,
        user_id: UserId,
        filters: NotificationFilterParams,
    ) -> Result<PaginatedNotificationsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM notifications");
        push_notification_filters(&mut count_query, user_id, &filters);
        let total: i64 = count_query.build_query_scalar().fetch_one(db).await?;

        let mut data_query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications"
        ));
        push_notification_filters(&mut data_query, user_id, &filters);
        data_query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let notifications = data_query
            .build_query_as::<Notification>()
            .fetch_all(db)
            .await?;

        Ok(PaginatedNotificationsResponse {
            data: notifications,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn unread_count(db: &SqlitePool, user_id: UserId) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .fetch_one(db)
                .await?;

        Ok(count)
    }

    /// Marks one notification as read. Already read notifications keep their
    /// original `read_at`.
    #[instrument(skip(db))]
    pub async fn mark_read(
        db: &SqlitePool,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications
             SET is_read = 1, read_at = COALESCE(read_at, CURRENT_TIMESTAMP)
             WHERE id = ? AND user_id = ?
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(not_found)
    }

    /// Returns how many notifications changed state.
    #[instrument(skip(db))]
    pub async fn mark_all_read(db: &SqlitePool, user_id: UserId) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications
             SET is_read = 1, read_at = CURRENT_TIMESTAMP
             WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(db))]
    pub async fn delete_notification(
        db: &SqlitePool,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }

        Ok(())
    }
}
