use axum::{Router, routing::get};

use crate::modules::contents::controller::get_weekly_contents;
use crate::state::AppState;

use super::controller::{create_subject, delete_subject, get_subject, get_subjects, update_subject};

pub fn init_subjects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_subjects).post(create_subject))
        .route(
            "/{id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
        .route("/{id}/contents/weekly", get(get_weekly_contents))
}
