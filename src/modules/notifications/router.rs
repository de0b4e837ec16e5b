use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    delete_notification, get_notifications, get_unread_count, mark_all_read, mark_read,
};

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/unread-count", get(get_unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", patch(mark_read))
        .route("/{id}", delete(delete_notification))
}
