use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use cuaderno_core::search::contains_pattern;
use cuaderno_core::{AppError, PaginationMeta};

use super::model::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, SubjectFilterParams, SubjectId,
    UpdateSubjectDto,
};

const SUBJECT_COLUMNS: &str = "id, code, name, description, year, created_at, updated_at";

fn duplicate_code(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::bad_request(anyhow::anyhow!("A subject with this code already exists"));
    }
    AppError::from(e)
}

fn push_subject_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &SubjectFilterParams) {
    builder.push(" WHERE 1 = 1");

    if let Some(year) = filters.year {
        builder.push(" AND year = ").push_bind(year);
    }

    if let Some(search) = &filters.search {
        let pattern = contains_pattern(search);
        builder
            .push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR code LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
}

pub struct SubjectService;

impl SubjectService {
    #[instrument(skip(db))]
    pub async fn create_subject(db: &SqlitePool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "INSERT INTO subjects (code, name, description, year)
             VALUES (?, ?, ?, ?)
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(dto.code.trim().to_uppercase())
        .bind(dto.name.trim())
        .bind(&dto.description)
        .bind(dto.year)
        .fetch_one(db)
        .await
        .map_err(duplicate_code)?;

        Ok(subject)
    }

    #[instrument(skip(db))]
    pub async fn get_subjects(
        db: &SqlitePool,
        filters: SubjectFilterParams,
    ) -> Result<PaginatedSubjectsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM subjects");
        push_subject_filters(&mut count_query, &filters);
        let total: i64 = count_query.build_query_scalar().fetch_one(db).await?;

        let mut data_query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {SUBJECT_COLUMNS} FROM subjects"));
        push_subject_filters(&mut data_query, &filters);
        data_query
            .push(" ORDER BY year, name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let subjects = data_query.build_query_as::<Subject>().fetch_all(db).await?;

        Ok(PaginatedSubjectsResponse {
            data: subjects,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_subject(db: &SqlitePool, id: SubjectId) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subject not found")))
    }

    /// Fails with 404 unless the subject exists.
    pub async fn ensure_exists(db: &SqlitePool, id: SubjectId) -> Result<(), AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?)")
            .bind(id)
            .fetch_one(db)
            .await?;

        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Subject not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn update_subject(
        db: &SqlitePool,
        id: SubjectId,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        let existing = Self::get_subject(db, id).await?;

        let code = dto
            .code
            .map(|c| c.trim().to_uppercase())
            .unwrap_or(existing.code);
        let name = dto.name.unwrap_or(existing.name);
        let description = dto.description.unwrap_or(existing.description);
        let year = dto.year.unwrap_or(existing.year);

        let subject = sqlx::query_as::<_, Subject>(&format!(
            "UPDATE subjects
             SET code = ?, name = ?, description = ?, year = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(&code)
        .bind(name.trim())
        .bind(&description)
        .bind(year)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(duplicate_code)?;

        Ok(subject)
    }

    /// Deleting a subject removes its commissions, schedules, contents and
    /// evaluations through foreign key cascades.
    #[instrument(skip(db))]
    pub async fn delete_subject(db: &SqlitePool, id: SubjectId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Subject not found")));
        }

        Ok(())
    }
}
