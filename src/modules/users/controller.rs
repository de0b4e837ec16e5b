use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use cuaderno_core::AppError;
use cuaderno_models::MessageResponse;

use crate::metrics::track_user_created;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::users::model::{
    ChangePasswordDto, CreateUserDto, PaginatedUsersResponse, UpdateProfileDto, UpdateUserDto,
    User, UserFilterParams, UserId,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 401, description = "Unauthorized - missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, auth_user.user_id()?).await?;
    Ok(Json(user))
}

/// Update the current user's name and email preferences
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_profile(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(user))
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/api/users/profile/change-password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::change_password(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Paginated list of users", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let users = UserService::get_users(&state.db, filters).await?;
    Ok(Json(users))
}

/// Create a user with any role (admin only)
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Email already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create_user(&state.db, dto).await?;
    track_user_created(user.role.as_str());
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by id (admin only)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

/// Update a user (admin only)
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Email already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_user(&state.db, id, dto).await?;
    Ok(Json(user))
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete your own account", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(auth_user): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state.db, id, auth_user.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
