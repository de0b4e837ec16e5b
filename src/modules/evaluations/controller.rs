use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use cuaderno_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateEvaluationDto, Evaluation, EvaluationFilterParams, EvaluationId,
    PaginatedEvaluationsResponse, UpdateEvaluationDto,
};
use super::service::EvaluationService;

/// Schedule an evaluation
#[utoipa::path(
    post,
    path = "/api/evaluations",
    request_body = CreateEvaluationDto,
    responses(
        (status = 201, description = "Evaluation created", body = Evaluation),
        (status = 400, description = "Commission does not belong to the subject", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - professors and admins only", body = ErrorResponse),
        (status = 404, description = "Subject or commission not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Evaluations"
)]
#[instrument(skip(state))]
pub async fn create_evaluation(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateEvaluationDto>,
) -> Result<(StatusCode, Json<Evaluation>), AppError> {
    let evaluation = EvaluationService::create_evaluation(
        &state.db,
        &state.notifier,
        auth_user.user_id()?,
        dto,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// List evaluations
#[utoipa::path(
    get,
    path = "/api/evaluations",
    params(EvaluationFilterParams),
    responses(
        (status = 200, description = "Paginated list of evaluations", body = PaginatedEvaluationsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Evaluations"
)]
#[instrument(skip(state))]
pub async fn get_evaluations(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<EvaluationFilterParams>,
) -> Result<Json<PaginatedEvaluationsResponse>, AppError> {
    let evaluations = EvaluationService::get_evaluations(&state.db, filters).await?;
    Ok(Json(evaluations))
}

/// Get an evaluation by id
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}",
    params(("id" = i64, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "Evaluation details", body = Evaluation),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Evaluation not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Evaluations"
)]
#[instrument(skip(state))]
pub async fn get_evaluation(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<EvaluationId>,
) -> Result<Json<Evaluation>, AppError> {
    let evaluation = EvaluationService::get_evaluation(&state.db, id).await?;
    Ok(Json(evaluation))
}

/// Update an evaluation
#[utoipa::path(
    put,
    path = "/api/evaluations/{id}",
    params(("id" = i64, Path, description = "Evaluation ID")),
    request_body = UpdateEvaluationDto,
    responses(
        (status = 200, description = "Evaluation updated", body = Evaluation),
        (status = 400, description = "Invalid commission or max score below recorded grades", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - professors and admins only", body = ErrorResponse),
        (status = 404, description = "Evaluation not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Evaluations"
)]
#[instrument(skip(state))]
pub async fn update_evaluation(
    State(state): State<AppState>,
    _teacher: RequireTeacher,
    Path(id): Path<EvaluationId>,
    ValidatedJson(dto): ValidatedJson<UpdateEvaluationDto>,
) -> Result<Json<Evaluation>, AppError> {
    let evaluation = EvaluationService::update_evaluation(&state.db, id, dto).await?;
    Ok(Json(evaluation))
}

/// Delete an evaluation and its grades
#[utoipa::path(
    delete,
    path = "/api/evaluations/{id}",
    params(("id" = i64, Path, description = "Evaluation ID")),
    responses(
        (status = 204, description = "Evaluation deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - professors and admins only", body = ErrorResponse),
        (status = 404, description = "Evaluation not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Evaluations"
)]
#[instrument(skip(state))]
pub async fn delete_evaluation(
    State(state): State<AppState>,
    _teacher: RequireTeacher,
    Path(id): Path<EvaluationId>,
) -> Result<StatusCode, AppError> {
    EvaluationService::delete_evaluation(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
