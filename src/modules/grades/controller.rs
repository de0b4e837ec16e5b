use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use cuaderno_core::AppError;

use crate::middleware::role::{RequireStudent, RequireTeacher};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    EvaluationId, Grade, GradeId, MyGradesFilterParams, RecordGradesDto, RecordGradesResponse,
    StudentGrade, SubjectGradeSummary,
};
use super::service::GradeService;

/// List the grades recorded for an evaluation
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/grades",
    params(("id" = i64, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "Grades with student names", body = Vec<Grade>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - professors and admins only", body = ErrorResponse),
        (status = 404, description = "Evaluation not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state))]
pub async fn get_evaluation_grades(
    State(state): State<AppState>,
    _teacher: RequireTeacher,
    Path(evaluation_id): Path<EvaluationId>,
) -> Result<Json<Vec<Grade>>, AppError> {
    let grades = GradeService::get_evaluation_grades(&state.db, evaluation_id).await?;
    Ok(Json(grades))
}

/// Record or replace grades for an evaluation
#[utoipa::path(
    put,
    path = "/api/evaluations/{id}/grades",
    params(("id" = i64, Path, description = "Evaluation ID")),
    request_body = RecordGradesDto,
    responses(
        (status = 200, description = "Grades recorded", body = RecordGradesResponse),
        (status = 400, description = "Score above the maximum, duplicate or non-student entry", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - professors and admins only", body = ErrorResponse),
        (status = 404, description = "Evaluation not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, dto))]
pub async fn record_grades(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    Path(evaluation_id): Path<EvaluationId>,
    ValidatedJson(dto): ValidatedJson<RecordGradesDto>,
) -> Result<Json<RecordGradesResponse>, AppError> {
    let response = GradeService::record_grades(
        &state.db,
        &state.notifier,
        auth_user.user_id()?,
        evaluation_id,
        dto,
    )
    .await?;
    Ok(Json(response))
}

/// Delete a grade
#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    params(("id" = i64, Path, description = "Grade ID")),
    responses(
        (status = 204, description = "Grade deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - professors and admins only", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state))]
pub async fn delete_grade(
    State(state): State<AppState>,
    _teacher: RequireTeacher,
    Path(id): Path<GradeId>,
) -> Result<StatusCode, AppError> {
    GradeService::delete_grade(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The calling student's grades
#[utoipa::path(
    get,
    path = "/api/grades/me",
    params(MyGradesFilterParams),
    responses(
        (status = 200, description = "Own grades with evaluation and subject", body = Vec<StudentGrade>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state))]
pub async fn get_my_grades(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    Query(filters): Query<MyGradesFilterParams>,
) -> Result<Json<Vec<StudentGrade>>, AppError> {
    let grades = GradeService::get_student_grades(&state.db, auth_user.user_id()?, filters).await?;
    Ok(Json(grades))
}

/// Per-subject averages for the calling student
#[utoipa::path(
    get,
    path = "/api/grades/me/summary",
    responses(
        (status = 200, description = "Averages on a 0 to 10 scale", body = Vec<SubjectGradeSummary>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state))]
pub async fn get_my_grade_summary(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
) -> Result<Json<Vec<SubjectGradeSummary>>, AppError> {
    let summary = GradeService::get_student_summary(&state.db, auth_user.user_id()?).await?;
    Ok(Json(summary))
}
