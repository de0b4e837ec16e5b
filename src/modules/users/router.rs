use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::users::controller::{
    change_password, create_user, delete_user, get_profile, get_user, get_users, update_profile,
    update_user,
};
use crate::state::AppState;

/// Routes available to every authenticated user.
pub fn init_profile_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/change-password", post(change_password))
}

/// Account management routes. Mounted behind the admin route layer.
pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}
