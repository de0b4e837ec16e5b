use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{
    create_commission, delete_commission, enroll_students, get_commission, get_commission_students,
    get_commissions, unenroll_student, update_commission,
};

pub fn init_commissions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_commissions).post(create_commission))
        .route(
            "/{id}",
            get(get_commission)
                .put(update_commission)
                .delete(delete_commission),
        )
        .route(
            "/{id}/students",
            get(get_commission_students).post(enroll_students),
        )
        .route("/{id}/students/{student_id}", delete(unenroll_student))
}
