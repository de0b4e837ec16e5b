use axum::{
    Router,
    routing::get,
};

use crate::modules::grades::controller::{get_evaluation_grades, record_grades};
use crate::state::AppState;

use super::controller::{
    create_evaluation, delete_evaluation, get_evaluation, get_evaluations, update_evaluation,
};

pub fn init_evaluations_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_evaluations).post(create_evaluation))
        .route(
            "/{id}",
            get(get_evaluation)
                .put(update_evaluation)
                .delete(delete_evaluation),
        )
        .route(
            "/{id}/grades",
            get(get_evaluation_grades).put(record_grades),
        )
}
