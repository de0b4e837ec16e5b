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
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, SubjectFilterParams, SubjectId,
    UpdateSubjectDto,
};
use super::service::SubjectService;

/// Create a subject
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = CreateSubjectDto,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 400, description = "Subject code already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subjects"
)]
#[instrument(skip(state))]
pub async fn create_subject(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateSubjectDto>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = SubjectService::create_subject(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

/// List subjects
#[utoipa::path(
    get,
    path = "/api/subjects",
    params(SubjectFilterParams),
    responses(
        (status = 200, description = "Paginated list of subjects", body = PaginatedSubjectsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subjects"
)]
#[instrument(skip(state))]
pub async fn get_subjects(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<SubjectFilterParams>,
) -> Result<Json<PaginatedSubjectsResponse>, AppError> {
    let subjects = SubjectService::get_subjects(&state.db, filters).await?;
    Ok(Json(subjects))
}

/// Get a subject by id
#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject details", body = Subject),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subjects"
)]
#[instrument(skip(state))]
pub async fn get_subject(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<SubjectId>,
) -> Result<Json<Subject>, AppError> {
    let subject = SubjectService::get_subject(&state.db, id).await?;
    Ok(Json(subject))
}

/// Update a subject
#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    request_body = UpdateSubjectDto,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 400, description = "Subject code already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subjects"
)]
#[instrument(skip(state))]
pub async fn update_subject(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<SubjectId>,
    ValidatedJson(dto): ValidatedJson<UpdateSubjectDto>,
) -> Result<Json<Subject>, AppError> {
    let subject = SubjectService::update_subject(&state.db, id, dto).await?;
    Ok(Json(subject))
}

/// Delete a subject and everything that hangs from it
#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subjects"
)]
#[instrument(skip(state))]
pub async fn delete_subject(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<SubjectId>,
) -> Result<StatusCode, AppError> {
    SubjectService::delete_subject(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
