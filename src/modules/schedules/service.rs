use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{instrument, warn};

use cuaderno_core::AppError;

use crate::messaging::NotificationPublisher;
use crate::metrics::track_schedule_conflict;
use crate::modules::commissions::service::CommissionService;
use crate::modules::notifications::model::NotificationKind;
use crate::modules::subjects::service::SubjectService;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::model::{
    ClassTime, CommissionId, CreateScheduleDto, Schedule, ScheduleFilterParams, ScheduleId,
    SubjectId, UpdateScheduleDto, UserId, WeekdaySchedule, group_by_weekday,
};

const SCHEDULE_SELECT: &str = "SELECT sc.id, sc.subject_id, s.name AS subject_name,
        sc.commission_id, c.name AS commission_name,
        sc.professor_id, (u.first_name || ' ' || u.last_name) AS professor_name,
        sc.day_of_week, sc.start_time, sc.end_time, sc.classroom, sc.created_at, sc.updated_at
     FROM schedules sc
     JOIN subjects s ON s.id = sc.subject_id
     JOIN commissions c ON c.id = sc.commission_id
     JOIN users u ON u.id = sc.professor_id";

const WEEKDAY_NAMES_ES: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

/// A session as it would be stored, used for validation and conflict checks.
#[derive(Debug, Clone)]
struct Slot {
    subject_id: SubjectId,
    commission_id: CommissionId,
    professor_id: UserId,
    day_of_week: i64,
    start_time: ClassTime,
    end_time: ClassTime,
    classroom: Option<String>,
}

fn normalize_classroom(classroom: Option<String>) -> Option<String> {
    classroom
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn push_schedule_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &ScheduleFilterParams) {
    builder.push(" WHERE 1 = 1");

    if let Some(subject_id) = filters.subject_id {
        builder.push(" AND sc.subject_id = ").push_bind(subject_id);
    }
    if let Some(commission_id) = filters.commission_id {
        builder.push(" AND sc.commission_id = ").push_bind(commission_id);
    }
    if let Some(professor_id) = filters.professor_id {
        builder.push(" AND sc.professor_id = ").push_bind(professor_id);
    }
    if let Some(day_of_week) = filters.day_of_week {
        builder.push(" AND sc.day_of_week = ").push_bind(day_of_week);
    }
    if let Some(classroom) = &filters.classroom {
        builder
            .push(" AND sc.classroom = ")
            .push_bind(classroom.trim().to_string())
            .push(" COLLATE NOCASE");
    }
}

pub struct ScheduleService;

impl ScheduleService {
    async fn validate_slot(db: &SqlitePool, slot: &Slot) -> Result<(), AppError> {
        if slot.start_time >= slot.end_time {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "Start time must be before end time"
            )));
        }

        SubjectService::ensure_exists(db, slot.subject_id).await?;
        CommissionService::ensure_belongs_to_subject(db, slot.commission_id, slot.subject_id)
            .await?;

        if !UserService::has_role(db, slot.professor_id, UserRole::Professor).await? {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "User {} is not a professor",
                slot.professor_id
            )));
        }

        Ok(())
    }

    /// Finds a session on the same day whose time range overlaps `slot` and
    /// that shares its professor, its commission or its classroom.
    async fn find_conflict(
        db: &SqlitePool,
        slot: &Slot,
        exclude: Option<ScheduleId>,
    ) -> Result<Option<ScheduleId>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM schedules WHERE day_of_week = ");
        query
            .push_bind(slot.day_of_week)
            .push(" AND time(start_time) < time(")
            .push_bind(slot.end_time)
            .push(") AND time(")
            .push_bind(slot.start_time)
            .push(") < time(end_time) AND (professor_id = ")
            .push_bind(slot.professor_id)
            .push(" OR commission_id = ")
            .push_bind(slot.commission_id);

        if let Some(classroom) = &slot.classroom {
            query
                .push(" OR classroom = ")
                .push_bind(classroom.clone())
                .push(" COLLATE NOCASE");
        }
        query.push(")");

        if let Some(id) = exclude {
            query.push(" AND id != ").push_bind(id);
        }
        query.push(" ORDER BY id LIMIT 1");

        let conflict: Option<ScheduleId> = query.build_query_scalar().fetch_optional(db).await?;
        Ok(conflict)
    }

    async fn ensure_no_conflict(
        db: &SqlitePool,
        slot: &Slot,
        exclude: Option<ScheduleId>,
    ) -> Result<(), AppError> {
        if let Some(conflicting) = Self::find_conflict(db, slot, exclude).await? {
            track_schedule_conflict();
            warn!(
                conflicting_schedule = %conflicting,
                day_of_week = slot.day_of_week,
                "Schedule conflict detected"
            );
            return Err(AppError::conflict(anyhow::anyhow!(
                "Schedule conflicts with existing session {conflicting}"
            )));
        }
        Ok(())
    }

    /// Notifies the commission's students and the professor about a session.
    async fn notify_change(
        db: &SqlitePool,
        notifier: &NotificationPublisher,
        schedule: &Schedule,
        created: bool,
    ) {
        if !notifier.is_enabled() {
            return;
        }

        let mut recipients = match CommissionService::student_ids(db, schedule.commission_id).await
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = ?e.error, schedule_id = %schedule.id, "Failed to load enrolled students");
                Vec::new()
            }
        };
        if !recipients.contains(&schedule.professor_id) {
            recipients.push(schedule.professor_id);
        }

        let title = if created {
            format!("Nuevo horario de {}", schedule.subject_name)
        } else {
            format!("Cambio de horario en {}", schedule.subject_name)
        };
        let day = usize::try_from(schedule.day_of_week - 1)
            .ok()
            .and_then(|i| WEEKDAY_NAMES_ES.get(i))
            .copied()
            .unwrap_or("día sin asignar");
        let mut message = format!(
            "Comisión {}: {} de {} a {}",
            schedule.commission_name, day, schedule.start_time, schedule.end_time
        );
        if let Some(classroom) = &schedule.classroom {
            message.push_str(&format!(", aula {classroom}"));
        }

        notifier.notify_users(
            &recipients,
            NotificationKind::Schedule,
            &title,
            &message,
            false,
        );
    }

    #[instrument(skip(db, notifier))]
    pub async fn create_schedule(
        db: &SqlitePool,
        notifier: &NotificationPublisher,
        dto: CreateScheduleDto,
    ) -> Result<Schedule, AppError> {
        let slot = Slot {
            subject_id: dto.subject_id,
            commission_id: dto.commission_id,
            professor_id: dto.professor_id,
            day_of_week: dto.day_of_week,
            start_time: dto.start_time,
            end_time: dto.end_time,
            classroom: normalize_classroom(dto.classroom),
        };

        Self::validate_slot(db, &slot).await?;
        Self::ensure_no_conflict(db, &slot, None).await?;

        let id: ScheduleId = sqlx::query_scalar(
            "INSERT INTO schedules
                (subject_id, commission_id, professor_id, day_of_week, start_time, end_time, classroom)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(slot.subject_id)
        .bind(slot.commission_id)
        .bind(slot.professor_id)
        .bind(slot.day_of_week)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(&slot.classroom)
        .fetch_one(db)
        .await?;

        let schedule = Self::get_schedule(db, id).await?;
        Self::notify_change(db, notifier, &schedule, true).await;

        Ok(schedule)
    }

    #[instrument(skip(db))]
    pub async fn get_schedule(db: &SqlitePool, id: ScheduleId) -> Result<Schedule, AppError> {
        sqlx::query_as::<_, Schedule>(&format!("{SCHEDULE_SELECT} WHERE sc.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Schedule not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_schedules(
        db: &SqlitePool,
        filters: &ScheduleFilterParams,
    ) -> Result<Vec<Schedule>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(SCHEDULE_SELECT);
        push_schedule_filters(&mut query, filters);
        query.push(" ORDER BY sc.day_of_week, time(sc.start_time), sc.id");

        let schedules = query.build_query_as::<Schedule>().fetch_all(db).await?;
        Ok(schedules)
    }

    #[instrument(skip(db))]
    pub async fn get_weekly_schedule(
        db: &SqlitePool,
        filters: &ScheduleFilterParams,
    ) -> Result<Vec<WeekdaySchedule>, AppError> {
        let schedules = Self::get_schedules(db, filters).await?;
        Ok(group_by_weekday(schedules))
    }

    /// Weekly grid for a user: a professor's own sessions, a student's
    /// enrolled commissions, or every session for an admin.
    #[instrument(skip(db))]
    pub async fn get_user_schedule(
        db: &SqlitePool,
        user_id: UserId,
        role: UserRole,
    ) -> Result<Vec<WeekdaySchedule>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(SCHEDULE_SELECT);
        match role {
            UserRole::Professor => {
                query.push(" WHERE sc.professor_id = ").push_bind(user_id);
            }
            UserRole::Student => {
                query
                    .push(
                        " WHERE sc.commission_id IN
                          (SELECT commission_id FROM commission_students WHERE student_id = ",
                    )
                    .push_bind(user_id)
                    .push(")");
            }
            UserRole::Admin => {}
        }

        let schedules = query.build_query_as::<Schedule>().fetch_all(db).await?;
        Ok(group_by_weekday(schedules))
    }

    #[instrument(skip(db, notifier))]
    pub async fn update_schedule(
        db: &SqlitePool,
        notifier: &NotificationPublisher,
        id: ScheduleId,
        dto: UpdateScheduleDto,
    ) -> Result<Schedule, AppError> {
        let existing = Self::get_schedule(db, id).await?;

        let slot = Slot {
            subject_id: dto.subject_id.unwrap_or(existing.subject_id),
            commission_id: dto.commission_id.unwrap_or(existing.commission_id),
            professor_id: dto.professor_id.unwrap_or(existing.professor_id),
            day_of_week: dto.day_of_week.unwrap_or(existing.day_of_week),
            start_time: dto.start_time.unwrap_or(existing.start_time),
            end_time: dto.end_time.unwrap_or(existing.end_time),
            classroom: normalize_classroom(dto.classroom.unwrap_or(existing.classroom)),
        };

        Self::validate_slot(db, &slot).await?;
        Self::ensure_no_conflict(db, &slot, Some(id)).await?;

        sqlx::query(
            "UPDATE schedules
             SET subject_id = ?, commission_id = ?, professor_id = ?, day_of_week = ?,
                 start_time = ?, end_time = ?, classroom = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(slot.subject_id)
        .bind(slot.commission_id)
        .bind(slot.professor_id)
        .bind(slot.day_of_week)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(&slot.classroom)
        .bind(id)
        .execute(db)
        .await?;

        let schedule = Self::get_schedule(db, id).await?;
        Self::notify_change(db, notifier, &schedule, false).await;

        Ok(schedule)
    }

    #[instrument(skip(db))]
    pub async fn delete_schedule(db: &SqlitePool, id: ScheduleId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Schedule not found")));
        }

        Ok(())
    }
}
