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
    Content, ContentFilterParams, ContentId, CreateContentDto, PaginatedContentsResponse,
    SubjectId, UpdateContentDto, WeeklyContent,
};
use super::service::ContentService;

/// Publish content for a subject
#[utoipa::path(
    post,
    path = "/api/contents",
    request_body = CreateContentDto,
    responses(
        (status = 201, description = "Content published", body = Content),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - professors and admins only", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contents"
)]
#[instrument(skip(state))]
pub async fn create_content(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateContentDto>,
) -> Result<(StatusCode, Json<Content>), AppError> {
    let content =
        ContentService::create_content(&state.db, &state.notifier, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// List contents
#[utoipa::path(
    get,
    path = "/api/contents",
    params(ContentFilterParams),
    responses(
        (status = 200, description = "Paginated list of contents", body = PaginatedContentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contents"
)]
#[instrument(skip(state))]
pub async fn get_contents(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ContentFilterParams>,
) -> Result<Json<PaginatedContentsResponse>, AppError> {
    let contents = ContentService::get_contents(&state.db, filters).await?;
    Ok(Json(contents))
}

/// A subject's contents grouped by week
#[utoipa::path(
    get,
    path = "/api/subjects/{id}/contents/weekly",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Contents grouped by ascending week number", body = Vec<WeeklyContent>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contents"
)]
#[instrument(skip(state))]
pub async fn get_weekly_contents(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(subject_id): Path<SubjectId>,
) -> Result<Json<Vec<WeeklyContent>>, AppError> {
    let weeks = ContentService::get_weekly_contents(&state.db, subject_id).await?;
    Ok(Json(weeks))
}

/// Get a content item by id
#[utoipa::path(
    get,
    path = "/api/contents/{id}",
    params(("id" = i64, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Content details", body = Content),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contents"
)]
#[instrument(skip(state))]
pub async fn get_content(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<ContentId>,
) -> Result<Json<Content>, AppError> {
    let content = ContentService::get_content(&state.db, id).await?;
    Ok(Json(content))
}

/// Update a content item
#[utoipa::path(
    put,
    path = "/api/contents/{id}",
    params(("id" = i64, Path, description = "Content ID")),
    request_body = UpdateContentDto,
    responses(
        (status = 200, description = "Content updated", body = Content),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author of this content", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contents"
)]
#[instrument(skip(state))]
pub async fn update_content(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    Path(id): Path<ContentId>,
    ValidatedJson(dto): ValidatedJson<UpdateContentDto>,
) -> Result<Json<Content>, AppError> {
    let content = ContentService::update_content(&state.db, &auth_user, id, dto).await?;
    Ok(Json(content))
}

/// Delete a content item
#[utoipa::path(
    delete,
    path = "/api/contents/{id}",
    params(("id" = i64, Path, description = "Content ID")),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author of this content", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contents"
)]
#[instrument(skip(state))]
pub async fn delete_content(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    Path(id): Path<ContentId>,
) -> Result<StatusCode, AppError> {
    ContentService::delete_content(&state.db, &auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
