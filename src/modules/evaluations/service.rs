use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{instrument, warn};

use cuaderno_core::{AppError, PaginationMeta};

use crate::messaging::NotificationPublisher;
use crate::modules::commissions::service::CommissionService;
use crate::modules::notifications::model::NotificationKind;
use crate::modules::subjects::service::SubjectService;
use crate::modules::users::model::UserId;

use super::model::{
    CreateEvaluationDto, Evaluation, EvaluationFilterParams, EvaluationId,
    PaginatedEvaluationsResponse, UpdateEvaluationDto,
};

const EVALUATION_SELECT: &str = "SELECT e.id, e.subject_id, s.name AS subject_name, e.commission_id,
        e.title, e.description, e.kind, e.scheduled_for, e.max_score, e.created_by,
        e.created_at, e.updated_at
     FROM evaluations e
     JOIN subjects s ON s.id = e.subject_id";

fn push_evaluation_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    filters: &EvaluationFilterParams,
) {
    builder.push(" WHERE 1 = 1");

    if let Some(subject_id) = filters.subject_id {
        builder.push(" AND e.subject_id = ").push_bind(subject_id);
    }
    if let Some(commission_id) = filters.commission_id {
        builder.push(" AND e.commission_id = ").push_bind(commission_id);
    }
    if let Some(kind) = filters.kind {
        builder.push(" AND e.kind = ").push_bind(kind);
    }
    if let Some(from) = filters.from {
        builder.push(" AND e.scheduled_for >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        builder.push(" AND e.scheduled_for <= ").push_bind(to);
    }
}

pub struct EvaluationService;

impl EvaluationService {
    #[instrument(skip(db, notifier))]
    pub async fn create_evaluation(
        db: &SqlitePool,
        notifier: &NotificationPublisher,
        created_by: UserId,
        dto: CreateEvaluationDto,
    ) -> Result<Evaluation, AppError> {
        SubjectService::ensure_exists(db, dto.subject_id).await?;
        if let Some(commission_id) = dto.commission_id {
            CommissionService::ensure_belongs_to_subject(db, commission_id, dto.subject_id).await?;
        }

        let id: EvaluationId = sqlx::query_scalar(
            "INSERT INTO evaluations
                (subject_id, commission_id, title, description, kind, scheduled_for, max_score, created_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(dto.subject_id)
        .bind(dto.commission_id)
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.kind)
        .bind(dto.scheduled_for)
        .bind(dto.max_score)
        .bind(created_by)
        .fetch_one(db)
        .await?;

        let evaluation = Self::get_evaluation(db, id).await?;
        Self::notify_scheduled(db, notifier, &evaluation).await;

        Ok(evaluation)
    }

    /// Notifies the commission's students, or every student of the subject
    /// when the evaluation is not tied to a commission.
    async fn notify_scheduled(
        db: &SqlitePool,
        notifier: &NotificationPublisher,
        evaluation: &Evaluation,
    ) {
        if !notifier.is_enabled() {
            return;
        }

        let recipients = match evaluation.commission_id {
            Some(commission_id) => CommissionService::student_ids(db, commission_id).await,
            None => {
                CommissionService::enrolled_student_ids_for_subject(db, evaluation.subject_id).await
            }
        };

        match recipients {
            Ok(students) => notifier.notify_users(
                &students,
                NotificationKind::Evaluation,
                &format!("Nueva evaluación en {}", evaluation.subject_name),
                &format!(
                    "{} ({}) programada para el {}",
                    evaluation.title,
                    evaluation.kind,
                    evaluation.scheduled_for.format("%d/%m/%Y")
                ),
                true,
            ),
            Err(e) => {
                warn!(error = ?e.error, evaluation_id = %evaluation.id, "Failed to load enrolled students");
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn get_evaluations(
        db: &SqlitePool,
        filters: EvaluationFilterParams,
    ) -> Result<PaginatedEvaluationsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM evaluations e");
        push_evaluation_filters(&mut count_query, &filters);
        let total: i64 = count_query.build_query_scalar().fetch_one(db).await?;

        let mut data_query = QueryBuilder::<Sqlite>::new(EVALUATION_SELECT);
        push_evaluation_filters(&mut data_query, &filters);
        data_query
            .push(" ORDER BY e.scheduled_for, e.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let evaluations = data_query
            .build_query_as::<Evaluation>()
            .fetch_all(db)
            .await?;

        Ok(PaginatedEvaluationsResponse {
            data: evaluations,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_evaluation(db: &SqlitePool, id: EvaluationId) -> Result<Evaluation, AppError> {
        sqlx::query_as::<_, Evaluation>(&format!("{EVALUATION_SELECT} WHERE e.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Evaluation not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_evaluation(
        db: &SqlitePool,
        id: EvaluationId,
        dto: UpdateEvaluationDto,
    ) -> Result<Evaluation, AppError> {
        let existing = Self::get_evaluation(db, id).await?;

        let commission_id = dto.commission_id.unwrap_or(existing.commission_id);
        if let Some(commission_id) = commission_id
            && Some(commission_id) != existing.commission_id
        {
            CommissionService::ensure_belongs_to_subject(db, commission_id, existing.subject_id)
                .await?;
        }

        let max_score = dto.max_score.unwrap_or(existing.max_score);
        if max_score < existing.max_score {
            let highest: Option<f64> =
                sqlx::query_scalar("SELECT MAX(score) FROM grades WHERE evaluation_id = ?")
                    .bind(id)
                    .fetch_one(db)
                    .await?;
            if let Some(highest) = highest
                && highest > max_score
            {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Max score cannot be lower than an already recorded grade ({highest})"
                )));
            }
        }

        let title = dto.title.unwrap_or(existing.title);
        let description = dto.description.unwrap_or(existing.description);
        let kind = dto.kind.unwrap_or(existing.kind);
        let scheduled_for = dto.scheduled_for.unwrap_or(existing.scheduled_for);

        sqlx::query(
            "UPDATE evaluations
             SET commission_id = ?, title = ?, description = ?, kind = ?, scheduled_for = ?,
                 max_score = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(commission_id)
        .bind(title.trim())
        .bind(&description)
        .bind(kind)
        .bind(scheduled_for)
        .bind(max_score)
        .bind(id)
        .execute(db)
        .await?;

        Self::get_evaluation(db, id).await
    }

    /// Grades of the evaluation are removed with it.
    #[instrument(skip(db))]
    pub async fn delete_evaluation(db: &SqlitePool, id: EvaluationId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM evaluations WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Evaluation not found")));
        }

        Ok(())
    }
}
