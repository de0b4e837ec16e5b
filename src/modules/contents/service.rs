use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{instrument, warn};

use cuaderno_core::search::contains_pattern;
use cuaderno_core::{AppError, PaginationMeta};

use crate::messaging::NotificationPublisher;
use crate::middleware::auth::AuthUser;
use crate::modules::commissions::service::CommissionService;
use crate::modules::notifications::model::NotificationKind;
use crate::modules::subjects::service::SubjectService;

use super::model::{
    Content, ContentFilterParams, ContentId, CreateContentDto, PaginatedContentsResponse,
    SubjectId, UpdateContentDto, WeeklyContent, group_by_week,
};

const CONTENT_SELECT: &str = "SELECT ct.id, ct.subject_id, s.name AS subject_name, ct.week_number,
        ct.title, ct.body, ct.resource_url, ct.author_id,
        CASE WHEN u.id IS NULL THEN NULL ELSE u.first_name || ' ' || u.last_name END AS author_name,
        ct.published_at, ct.updated_at
     FROM contents ct
     JOIN subjects s ON s.id = ct.subject_id
     LEFT JOIN users u ON u.id = ct.author_id";

fn push_content_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &ContentFilterParams) {
    builder.push(" WHERE 1 = 1");

    if let Some(subject_id) = filters.subject_id {
        builder.push(" AND ct.subject_id = ").push_bind(subject_id);
    }
    if let Some(week_number) = filters.week_number {
        builder.push(" AND ct.week_number = ").push_bind(week_number);
    }
    if let Some(author_id) = filters.author_id {
        builder.push(" AND ct.author_id = ").push_bind(author_id);
    }
    if let Some(search) = &filters.search {
        let pattern = contains_pattern(search);
        builder
            .push(" AND (ct.title LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR ct.body LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
}

/// Professors may only change what they authored. Admins may change anything.
fn ensure_can_modify(content: &Content, auth_user: &AuthUser) -> Result<(), AppError> {
    if auth_user.is_admin() || content.author_id == Some(auth_user.user_id()?) {
        return Ok(());
    }
    Err(AppError::forbidden(
        "You can only modify content you authored".to_string(),
    ))
}

pub struct ContentService;

impl ContentService {
    #[instrument(skip(db, notifier, auth_user))]
    pub async fn create_content(
        db: &SqlitePool,
        notifier: &NotificationPublisher,
        auth_user: &AuthUser,
        dto: CreateContentDto,
    ) -> Result<Content, AppError> {
        SubjectService::ensure_exists(db, dto.subject_id).await?;

        let id: ContentId = sqlx::query_scalar(
            "INSERT INTO contents (subject_id, week_number, title, body, resource_url, author_id)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(dto.subject_id)
        .bind(dto.week_number)
        .bind(dto.title.trim())
        .bind(&dto.body)
        .bind(&dto.resource_url)
        .bind(auth_user.user_id()?)
        .fetch_one(db)
        .await?;

        let content = Self::get_content(db, id).await?;
        Self::notify_published(db, notifier, &content).await;

        Ok(content)
    }

    async fn notify_published(db: &SqlitePool, notifier: &NotificationPublisher, content: &Content) {
        if !notifier.is_enabled() {
            return;
        }

        match CommissionService::enrolled_student_ids_for_subject(db, content.subject_id).await {
            Ok(students) => notifier.notify_users(
                &students,
                NotificationKind::Content,
                &format!("Nuevo contenido en {}", content.subject_name),
                &format!("Semana {}: {}", content.week_number, content.title),
                false,
            ),
            Err(e) => {
                warn!(error = ?e.error, content_id = %content.id, "Failed to load enrolled students");
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn get_contents(
        db: &SqlitePool,
        filters: ContentFilterParams,
    ) -> Result<PaginatedContentsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM contents ct");
        push_content_filters(&mut count_query, &filters);
        let total: i64 = count_query.build_query_scalar().fetch_one(db).await?;

        let mut data_query = QueryBuilder::<Sqlite>::new(CONTENT_SELECT);
        push_content_filters(&mut data_query, &filters);
        data_query
            .push(" ORDER BY ct.week_number, ct.published_at, ct.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let contents = data_query.build_query_as::<Content>().fetch_all(db).await?;

        Ok(PaginatedContentsResponse {
            data: contents,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_weekly_contents(
        db: &SqlitePool,
        subject_id: SubjectId,
    ) -> Result<Vec<WeeklyContent>, AppError> {
        SubjectService::ensure_exists(db, subject_id).await?;

        let contents = sqlx::query_as::<_, Content>(&format!(
            "{CONTENT_SELECT} WHERE ct.subject_id = ? ORDER BY ct.week_number, ct.published_at, ct.id"
        ))
        .bind(subject_id)
        .fetch_all(db)
        .await?;

        Ok(group_by_week(contents))
    }

    #[instrument(skip(db))]
    pub async fn get_content(db: &SqlitePool, id: ContentId) -> Result<Content, AppError> {
        sqlx::query_as::<_, Content>(&format!("{CONTENT_SELECT} WHERE ct.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Content not found")))
    }

    #[instrument(skip(db, auth_user))]
    pub async fn update_content(
        db: &SqlitePool,
        auth_user: &AuthUser,
        id: ContentId,
        dto: UpdateContentDto,
    ) -> Result<Content, AppError> {
        let existing = Self::get_content(db, id).await?;
        ensure_can_modify(&existing, auth_user)?;

        let week_number = dto.week_number.unwrap_or(existing.week_number);
        let title = dto.title.unwrap_or(existing.title);
        let body = dto.body.unwrap_or(existing.body);
        let resource_url = dto.resource_url.unwrap_or(existing.resource_url);

        sqlx::query(
            "UPDATE contents
             SET week_number = ?, title = ?, body = ?, resource_url = ?,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(week_number)
        .bind(title.trim())
        .bind(&body)
        .bind(&resource_url)
        .bind(id)
        .execute(db)
        .await?;

        Self::get_content(db, id).await
    }

    #[instrument(skip(db, auth_user))]
    pub async fn delete_content(
        db: &SqlitePool,
        auth_user: &AuthUser,
        id: ContentId,
    ) -> Result<(), AppError> {
        let existing = Self::get_content(db, id).await?;
        ensure_can_modify(&existing, auth_user)?;

        sqlx::query("DELETE FROM contents WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(())
    }
}
