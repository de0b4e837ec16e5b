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
    Commission, CommissionFilterParams, CommissionId, CreateCommissionDto, EnrollStudentsDto,
    EnrolledStudent, EnrollmentResponse, PaginatedCommissionsResponse, UpdateCommissionDto,
    UserId,
};
use super::service::CommissionService;

/// Create a commission for a subject
#[utoipa::path(
    post,
    path = "/api/commissions",
    request_body = CreateCommissionDto,
    responses(
        (status = 201, description = "Commission created", body = Commission),
        (status = 400, description = "Duplicate commission name for the subject", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn create_commission(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateCommissionDto>,
) -> Result<(StatusCode, Json<Commission>), AppError> {
    let commission = CommissionService::create_commission(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(commission)))
}

/// List commissions
#[utoipa::path(
    get,
    path = "/api/commissions",
    params(CommissionFilterParams),
    responses(
        (status = 200, description = "Paginated list of commissions", body = PaginatedCommissionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn get_commissions(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<CommissionFilterParams>,
) -> Result<Json<PaginatedCommissionsResponse>, AppError> {
    let commissions = CommissionService::get_commissions(&state.db, filters).await?;
    Ok(Json(commissions))
}

/// Get a commission by id
#[utoipa::path(
    get,
    path = "/api/commissions/{id}",
    params(("id" = i64, Path, description = "Commission ID")),
    responses(
        (status = 200, description = "Commission details", body = Commission),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Commission not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn get_commission(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<CommissionId>,
) -> Result<Json<Commission>, AppError> {
    let commission = CommissionService::get_commission(&state.db, id).await?;
    Ok(Json(commission))
}

/// Update a commission
#[utoipa::path(
    put,
    path = "/api/commissions/{id}",
    params(("id" = i64, Path, description = "Commission ID")),
    request_body = UpdateCommissionDto,
    responses(
        (status = 200, description = "Commission updated", body = Commission),
        (status = 400, description = "Duplicate commission name for the subject", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Commission not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn update_commission(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<CommissionId>,
    ValidatedJson(dto): ValidatedJson<UpdateCommissionDto>,
) -> Result<Json<Commission>, AppError> {
    let commission = CommissionService::update_commission(&state.db, id, dto).await?;
    Ok(Json(commission))
}

/// Delete a commission
#[utoipa::path(
    delete,
    path = "/api/commissions/{id}",
    params(("id" = i64, Path, description = "Commission ID")),
    responses(
        (status = 204, description = "Commission deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Commission not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn delete_commission(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<CommissionId>,
) -> Result<StatusCode, AppError> {
    CommissionService::delete_commission(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the students enrolled in a commission
#[utoipa::path(
    get,
    path = "/api/commissions/{id}/students",
    params(("id" = i64, Path, description = "Commission ID")),
    responses(
        (status = 200, description = "Enrolled students", body = Vec<EnrolledStudent>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Commission not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn get_commission_students(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<CommissionId>,
) -> Result<Json<Vec<EnrolledStudent>>, AppError> {
    let students = CommissionService::get_students(&state.db, id).await?;
    Ok(Json(students))
}

/// Enroll students in a commission
#[utoipa::path(
    post,
    path = "/api/commissions/{id}/students",
    params(("id" = i64, Path, description = "Commission ID")),
    request_body = EnrollStudentsDto,
    responses(
        (status = 200, description = "Enrollment result", body = EnrollmentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Commission not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn enroll_students(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<CommissionId>,
    ValidatedJson(dto): ValidatedJson<EnrollStudentsDto>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let response = CommissionService::enroll_students(&state.db, id, dto).await?;
    Ok(Json(response))
}

/// Remove a student from a commission
#[utoipa::path(
    delete,
    path = "/api/commissions/{id}/students/{student_id}",
    params(
        ("id" = i64, Path, description = "Commission ID"),
        ("student_id" = i64, Path, description = "Student user ID")
    ),
    responses(
        (status = 204, description = "Student removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Student is not enrolled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Commissions"
)]
#[instrument(skip(state))]
pub async fn unenroll_student(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path((id, student_id)): Path<(CommissionId, UserId)>,
) -> Result<StatusCode, AppError> {
    CommissionService::unenroll_student(&state.db, id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
