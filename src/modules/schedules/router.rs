use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_schedule, delete_schedule, get_my_schedule, get_schedule, get_schedules,
    get_weekly_schedule, update_schedule,
};

pub fn init_schedules_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_schedules).post(create_schedule))
        .route("/weekly", get(get_weekly_schedule))
        .route("/me", get(get_my_schedule))
        .route(
            "/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
}
