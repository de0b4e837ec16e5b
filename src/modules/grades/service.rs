use std::collections::HashSet;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{info, instrument};

use cuaderno_core::AppError;

use crate::messaging::{NotificationMessage, NotificationPublisher};
use crate::metrics::track_grades_recorded;
use crate::modules::evaluations::service::EvaluationService;
use crate::modules::notifications::model::NotificationKind;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::model::{
    EvaluationId, Grade, GradeId, MyGradesFilterParams, RecordGradesDto, RecordGradesResponse,
    StudentGrade, SubjectGradeSummary, UserId,
};

const GRADE_SELECT: &str = "SELECT g.id, g.evaluation_id, g.student_id,
        u.first_name AS student_first_name, u.last_name AS student_last_name,
        g.score, g.feedback, g.graded_by, g.created_at, g.updated_at
     FROM grades g
     JOIN users u ON u.id = g.student_id";

pub struct GradeService;

impl GradeService {
    #[instrument(skip(db))]
    pub async fn get_evaluation_grades(
        db: &SqlitePool,
        evaluation_id: EvaluationId,
    ) -> Result<Vec<Grade>, AppError> {
        EvaluationService::get_evaluation(db, evaluation_id).await?;

        let grades = sqlx::query_as::<_, Grade>(&format!(
            "{GRADE_SELECT} WHERE g.evaluation_id = ? ORDER BY u.last_name, u.first_name"
        ))
        .bind(evaluation_id)
        .fetch_all(db)
        .await?;

        Ok(grades)
    }

    /// Inserts or replaces one grade per student for the evaluation. The whole
    /// batch is rejected if any entry is invalid.
    #[instrument(skip(db, notifier, dto), fields(entries = dto.grades.len()))]
    pub async fn record_grades(
        db: &SqlitePool,
        notifier: &NotificationPublisher,
        graded_by: UserId,
        evaluation_id: EvaluationId,
        dto: RecordGradesDto,
    ) -> Result<RecordGradesResponse, AppError> {
        let evaluation = EvaluationService::get_evaluation(db, evaluation_id).await?;

        let mut seen = HashSet::new();
        for entry in &dto.grades {
            if !seen.insert(entry.student_id) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Student {} appears more than once",
                    entry.student_id
                )));
            }
            if entry.score > evaluation.max_score {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Score {} for student {} exceeds the maximum of {}",
                    entry.score,
                    entry.student_id,
                    evaluation.max_score
                )));
            }
        }

        let requested: Vec<UserId> = dto.grades.iter().map(|g| g.student_id).collect();
        let students = UserService::ids_with_role(db, &requested, UserRole::Student).await?;
        if let Some(invalid) = requested.iter().find(|id| !students.contains(id)) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "User {invalid} is not a student"
            )));
        }

        let mut tx = db.begin().await?;
        for entry in &dto.grades {
            sqlx::query(
                "INSERT INTO grades (evaluation_id, student_id, score, feedback, graded_by)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(evaluation_id, student_id) DO UPDATE SET
                     score = excluded.score,
                     feedback = excluded.feedback,
                     graded_by = excluded.graded_by,
                     updated_at = CURRENT_TIMESTAMP",
            )
            .bind(evaluation_id)
            .bind(entry.student_id)
            .bind(entry.score)
            .bind(&entry.feedback)
            .bind(graded_by)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let recorded = dto.grades.len();
        track_grades_recorded(recorded);
        info!(evaluation_id = %evaluation_id, recorded, "Grades recorded");

        let mut query = QueryBuilder::<Sqlite>::new(GRADE_SELECT);
        query
            .push(" WHERE g.evaluation_id = ")
            .push_bind(evaluation_id)
            .push(" AND g.student_id IN (");
        let mut separated = query.separated(", ");
        for student_id in &requested {
            separated.push_bind(*student_id);
        }
        separated.push_unseparated(") ORDER BY u.last_name, u.first_name");
        let grades = query.build_query_as::<Grade>().fetch_all(db).await?;

        for grade in &grades {
            notifier.publish(
                NotificationMessage::new(
                    grade.student_id,
                    NotificationKind::Grade,
                    format!("Nueva nota en {}", evaluation.subject_name),
                    format!(
                        "{}: {} / {}",
                        evaluation.title, grade.score, evaluation.max_score
                    ),
                )
                .with_email(true),
            );
        }

        Ok(RecordGradesResponse { recorded, grades })
    }

    #[instrument(skip(db))]
    pub async fn delete_grade(db: &SqlitePool, id: GradeId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM grades WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Grade not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_student_grades(
        db: &SqlitePool,
        student_id: UserId,
        filters: MyGradesFilterParams,
    ) -> Result<Vec<StudentGrade>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT g.id, g.evaluation_id, e.title AS evaluation_title, e.kind, e.scheduled_for,
                    e.max_score, e.subject_id, s.name AS subject_name, g.score, g.feedback,
                    g.updated_at
             FROM grades g
             JOIN evaluations e ON e.id = g.evaluation_id
             JOIN subjects s ON s.id = e.subject_id
             WHERE g.student_id = ",
        );
        query.push_bind(student_id);

        if let Some(subject_id) = filters.subject_id {
            query.push(" AND e.subject_id = ").push_bind(subject_id);
        }
        query.push(" ORDER BY e.scheduled_for DESC, g.id DESC");

        let grades = query.build_query_as::<StudentGrade>().fetch_all(db).await?;
        Ok(grades)
    }

    /// Average per subject with every score rescaled to a 0..10 scale.
    #[instrument(skip(db))]
    pub async fn get_student_summary(
        db: &SqlitePool,
        student_id: UserId,
    ) -> Result<Vec<SubjectGradeSummary>, AppError> {
        let summary = sqlx::query_as::<_, SubjectGradeSummary>(
            "SELECT s.id AS subject_id, s.name AS subject_name,
                    COUNT(*) AS evaluations_graded,
                    ROUND(AVG(g.score * 10.0 / e.max_score), 2) AS average_score
             FROM grades g
             JOIN evaluations e ON e.id = g.evaluation_id
             JOIN subjects s ON s.id = e.subject_id
             WHERE g.student_id = ?
             GROUP BY s.id, s.name
             ORDER BY s.name",
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(summary)
    }
}
