use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{delete_grade, get_my_grade_summary, get_my_grades};

/// Grades of an evaluation are served from `/evaluations/{id}/grades`.
pub fn init_grades_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_my_grades))
        .route("/me/summary", get(get_my_grade_summary))
        .route("/{id}", delete(delete_grade))
}
