use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use cuaderno_core::{AppError, PaginationMeta};

use crate::modules::subjects::service::SubjectService;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::model::{
    Commission, CommissionFilterParams, CommissionId, CreateCommissionDto, EnrollStudentsDto,
    EnrolledStudent, EnrollmentResponse, PaginatedCommissionsResponse, SubjectId,
    UpdateCommissionDto, UserId,
};

const COMMISSION_SELECT: &str = "SELECT c.id, c.subject_id, s.name AS subject_name, c.name, c.year, c.shift,
        (SELECT COUNT(*) FROM commission_students cs WHERE cs.commission_id = c.id) AS student_count,
        c.created_at, c.updated_at
     FROM commissions c
     JOIN subjects s ON s.id = c.subject_id";

fn duplicate_name(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::bad_request(anyhow::anyhow!(
            "A commission with this name already exists for the subject"
        ));
    }
    AppError::from(e)
}

fn push_commission_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    filters: &CommissionFilterParams,
) {
    builder.push(" WHERE 1 = 1");

    if let Some(subject_id) = filters.subject_id {
        builder.push(" AND c.subject_id = ").push_bind(subject_id);
    }
    if let Some(year) = filters.year {
        builder.push(" AND c.year = ").push_bind(year);
    }
    if let Some(shift) = filters.shift {
        builder.push(" AND c.shift = ").push_bind(shift);
    }
}

pub struct CommissionService;

impl CommissionService {
    #[instrument(skip(db))]
    pub async fn create_commission(
        db: &SqlitePool,
        dto: CreateCommissionDto,
    ) -> Result<Commission, AppError> {
        SubjectService::ensure_exists(db, dto.subject_id).await?;

        let id: CommissionId = sqlx::query_scalar(
            "INSERT INTO commissions (subject_id, name, year, shift)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(dto.subject_id)
        .bind(dto.name.trim())
        .bind(dto.year)
        .bind(dto.shift)
        .fetch_one(db)
        .await
        .map_err(duplicate_name)?;

        Self::get_commission(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_commissions(
        db: &SqlitePool,
        filters: CommissionFilterParams,
    ) -> Result<PaginatedCommissionsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM commissions c");
        push_commission_filters(&mut count_query, &filters);
        let total: i64 = count_query.build_query_scalar().fetch_one(db).await?;

        let mut data_query = QueryBuilder::<Sqlite>::new(COMMISSION_SELECT);
        push_commission_filters(&mut data_query, &filters);
        data_query
            .push(" ORDER BY c.year DESC, s.name, c.name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let commissions = data_query
            .build_query_as::<Commission>()
            .fetch_all(db)
            .await?;

        Ok(PaginatedCommissionsResponse {
            data: commissions,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_commission(db: &SqlitePool, id: CommissionId) -> Result<Commission, AppError> {
        sqlx::query_as::<_, Commission>(&format!("{COMMISSION_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Commission not found")))
    }

    /// Checks that the commission exists and is a section of `subject_id`.
    pub async fn ensure_belongs_to_subject(
        db: &SqlitePool,
        id: CommissionId,
        subject_id: SubjectId,
    ) -> Result<(), AppError> {
        let owner: Option<SubjectId> =
            sqlx::query_scalar("SELECT subject_id FROM commissions WHERE id = ?")
                .bind(id)
                .fetch_optional(db)
                .await?;

        match owner {
            None => Err(AppError::not_found(anyhow::anyhow!("Commission not found"))),
            Some(owner) if owner != subject_id => Err(AppError::bad_request(anyhow::anyhow!(
                "Commission {id} does not belong to subject {subject_id}"
            ))),
            Some(_) => Ok(()),
        }
    }

    #[instrument(skip(db))]
    pub async fn update_commission(
        db: &SqlitePool,
        id: CommissionId,
        dto: UpdateCommissionDto,
    ) -> Result<Commission, AppError> {
        let existing = Self::get_commission(db, id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let year = dto.year.unwrap_or(existing.year);
        let shift = dto.shift.unwrap_or(existing.shift);

        sqlx::query(
            "UPDATE commissions
             SET name = ?, year = ?, shift = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(name.trim())
        .bind(year)
        .bind(shift)
        .bind(id)
        .execute(db)
        .await
        .map_err(duplicate_name)?;

        Self::get_commission(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_commission(db: &SqlitePool, id: CommissionId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM commissions WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Commission not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_students(
        db: &SqlitePool,
        id: CommissionId,
    ) -> Result<Vec<EnrolledStudent>, AppError> {
        Self::get_commission(db, id).await?;

        let students = sqlx::query_as::<_, EnrolledStudent>(
            "SELECT u.id, u.first_name, u.last_name, u.email, cs.enrolled_at
             FROM commission_students cs
             JOIN users u ON u.id = cs.student_id
             WHERE cs.commission_id = ?
             ORDER BY u.last_name, u.first_name",
        )
        .bind(id)
        .fetch_all(db)
        .await?;

        Ok(students)
    }

    /// Enrolls every id that belongs to a student. Ids already enrolled are
    /// counted separately and ids of non-students are reported back.
    #[instrument(skip(db))]
    pub async fn enroll_students(
        db: &SqlitePool,
        id: CommissionId,
        dto: EnrollStudentsDto,
    ) -> Result<EnrollmentResponse, AppError> {
        Self::get_commission(db, id).await?;

        let students = UserService::ids_with_role(db, &dto.student_ids, UserRole::Student).await?;
        let mut invalid_ids: Vec<UserId> = Vec::new();
        for student_id in &dto.student_ids {
            if !students.contains(student_id) && !invalid_ids.contains(student_id) {
                invalid_ids.push(*student_id);
            }
        }

        let mut tx = db.begin().await?;
        let mut enrolled_count = 0;
        for student_id in &students {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO commission_students (commission_id, student_id) VALUES (?, ?)",
            )
            .bind(id)
            .bind(*student_id)
            .execute(&mut *tx)
            .await?;
            enrolled_count += result.rows_affected() as usize;
        }
        tx.commit().await?;

        Ok(EnrollmentResponse {
            enrolled_count,
            already_enrolled_count: students.len() - enrolled_count,
            invalid_ids,
        })
    }

    #[instrument(skip(db))]
    pub async fn unenroll_student(
        db: &SqlitePool,
        id: CommissionId,
        student_id: UserId,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM commission_students WHERE commission_id = ? AND student_id = ?")
                .bind(id)
                .bind(student_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Student is not enrolled in this commission"
            )));
        }

        Ok(())
    }

    /// Ids of the students enrolled in a commission.
    pub async fn student_ids(db: &SqlitePool, id: CommissionId) -> Result<Vec<UserId>, AppError> {
        let ids = sqlx::query_scalar(
            "SELECT student_id FROM commission_students WHERE commission_id = ? ORDER BY student_id",
        )
        .bind(id)
        .fetch_all(db)
        .await?;

        Ok(ids)
    }

    /// Ids of the students enrolled in any commission of a subject.
    pub async fn enrolled_student_ids_for_subject(
        db: &SqlitePool,
        subject_id: SubjectId,
    ) -> Result<Vec<UserId>, AppError> {
        let ids = sqlx::query_scalar(
            "SELECT DISTINCT cs.student_id
             FROM commission_students cs
             JOIN commissions c ON c.id = cs.commission_id
             WHERE c.subject_id = ?
             ORDER BY cs.student_id",
        )
        .bind(subject_id)
        .fetch_all(db)
        .await?;

        Ok(ids)
    }
}
