use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use cuaderno_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateScheduleDto, Schedule, ScheduleFilterParams, ScheduleId, UpdateScheduleDto,
    WeekdaySchedule,
};
use super::service::ScheduleService;

/// Create a class session
#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = CreateScheduleDto,
    responses(
        (status = 201, description = "Session created", body = Schedule),
        (status = 400, description = "Commission does not belong to the subject or user is not a professor", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Subject or commission not found", body = ErrorResponse),
        (status = 409, description = "Overlaps an existing session", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
#[instrument(skip(state))]
pub async fn create_schedule(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateScheduleDto>,
) -> Result<(StatusCode, Json<Schedule>), AppError> {
    let schedule = ScheduleService::create_schedule(&state.db, &state.notifier, dto).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// List class sessions
#[utoipa::path(
    get,
    path = "/api/schedules",
    params(ScheduleFilterParams),
    responses(
        (status = 200, description = "Sessions ordered by weekday and start time", body = Vec<Schedule>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
#[instrument(skip(state))]
pub async fn get_schedules(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ScheduleFilterParams>,
) -> Result<Json<Vec<Schedule>>, AppError> {
    let schedules = ScheduleService::get_schedules(&state.db, &filters).await?;
    Ok(Json(schedules))
}

/// Class sessions grouped by weekday
#[utoipa::path(
    get,
    path = "/api/schedules/weekly",
    params(ScheduleFilterParams),
    responses(
        (status = 200, description = "Weekly grid, Monday first, empty days omitted", body = Vec<WeekdaySchedule>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
#[instrument(skip(state))]
pub async fn get_weekly_schedule(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ScheduleFilterParams>,
) -> Result<Json<Vec<WeekdaySchedule>>, AppError> {
    let weekly = ScheduleService::get_weekly_schedule(&state.db, &filters).await?;
    Ok(Json(weekly))
}

/// The caller's own weekly grid
#[utoipa::path(
    get,
    path = "/api/schedules/me",
    responses(
        (status = 200, description = "Professor: own sessions. Student: sessions of enrolled commissions", body = Vec<WeekdaySchedule>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
#[instrument(skip(state))]
pub async fn get_my_schedule(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<WeekdaySchedule>>, AppError> {
    let weekly =
        ScheduleService::get_user_schedule(&state.db, auth_user.user_id()?, auth_user.role())
            .await?;
    Ok(Json(weekly))
}

/// Get a class session by id
#[utoipa::path(
    get,
    path = "/api/schedules/{id}",
    params(("id" = i64, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Session details", body = Schedule),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
#[instrument(skip(state))]
pub async fn get_schedule(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<ScheduleId>,
) -> Result<Json<Schedule>, AppError> {
    let schedule = ScheduleService::get_schedule(&state.db, id).await?;
    Ok(Json(schedule))
}

/// Update a class session
#[utoipa::path(
    put,
    path = "/api/schedules/{id}",
    params(("id" = i64, Path, description = "Schedule ID")),
    request_body = UpdateScheduleDto,
    responses(
        (status = 200, description = "Session updated", body = Schedule),
        (status = 400, description = "Commission does not belong to the subject or user is not a professor", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
        (status = 409, description = "Overlaps an existing session", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
#[instrument(skip(state))]
pub async fn update_schedule(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ScheduleId>,
    ValidatedJson(dto): ValidatedJson<UpdateScheduleDto>,
) -> Result<Json<Schedule>, AppError> {
    let schedule = ScheduleService::update_schedule(&state.db, &state.notifier, id, dto).await?;
    Ok(Json(schedule))
}

/// Delete a class session
#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    params(("id" = i64, Path, description = "Schedule ID")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
#[instrument(skip(state))]
pub async fn delete_schedule(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ScheduleId>,
) -> Result<StatusCode, AppError> {
    ScheduleService::delete_schedule(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
