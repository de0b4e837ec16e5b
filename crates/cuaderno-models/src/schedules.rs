//! Schedules (horarios): weekly class sessions of a commission.
//!
//! Rows come out of the database flat and ordered by `(day_of_week,
//! start_time)`; [`group_by_weekday`] folds them into the weekly grid the
//! API returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use cuaderno_core::serde::{deserialize_nullable, deserialize_optional, deserialize_optional_string};

use crate::ids::{CommissionId, ScheduleId, SubjectId, UserId};
use crate::value_types::ClassTime;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Name of an ISO weekday, 1 = Monday .. 7 = Sunday.
pub fn day_name(day_of_week: i64) -> Option<&'static str> {
    usize::try_from(day_of_week)
        .ok()
        .and_then(|d| d.checked_sub(1))
        .and_then(|i| DAY_NAMES.get(i).copied())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Schedule {
    pub id: ScheduleId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub commission_id: CommissionId,
    pub commission_name: String,
    pub professor_id: UserId,
    pub professor_name: String,
    /// 1 = Monday .. 7 = Sunday
    pub day_of_week: i64,
    pub start_time: ClassTime,
    pub end_time: ClassTime,
    pub classroom: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One day of the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeekdaySchedule {
    pub day_of_week: i64,
    #[schema(example = "Monday")]
    pub day_name: String,
    pub sessions: Vec<Schedule>,
}

/// Groups sessions by weekday, Monday first, each day ordered by start time.
/// Days without sessions are left out.
pub fn group_by_weekday(mut sessions: Vec<Schedule>) -> Vec<WeekdaySchedule> {
    sessions.sort_by(|a, b| {
        (a.day_of_week, a.start_time, a.id).cmp(&(b.day_of_week, b.start_time, b.id))
    });

    let mut days: Vec<WeekdaySchedule> = Vec::new();
    for session in sessions {
        match days.last_mut() {
            Some(day) if day.day_of_week == session.day_of_week => day.sessions.push(session),
            _ => days.push(WeekdaySchedule {
                day_of_week: session.day_of_week,
                day_name: day_name(session.day_of_week).unwrap_or("Unknown").to_string(),
                sessions: vec![session],
            }),
        }
    }
    days
}

fn validate_time_range(start: ClassTime, end: ClassTime) -> Result<(), ValidationError> {
    if start >= end {
        let mut error = ValidationError::new("time_range");
        error.message = Some("Start time must be before end time".into());
        return Err(error);
    }
    Ok(())
}

fn validate_create_range(dto: &CreateScheduleDto) -> Result<(), ValidationError> {
    validate_time_range(dto.start_time, dto.end_time)
}

fn validate_update_range(dto: &UpdateScheduleDto) -> Result<(), ValidationError> {
    match (dto.start_time, dto.end_time) {
        (Some(start), Some(end)) => validate_time_range(start, end),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_range", skip_on_field_errors = false))]
pub struct CreateScheduleDto {
    pub subject_id: SubjectId,
    pub commission_id: CommissionId,
    pub professor_id: UserId,
    #[validate(range(min = 1, max = 7, message = "Day of week must be between 1 (Monday) and 7 (Sunday)"))]
    pub day_of_week: i64,
    pub start_time: ClassTime,
    pub end_time: ClassTime,
    #[validate(length(min = 1, max = 50))]
    pub classroom: Option<String>,
}

/// Partial update. A time range that ends up inverted after merging with the
/// stored row is rejected by the service.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_range", skip_on_field_errors = false))]
pub struct UpdateScheduleDto {
    pub subject_id: Option<SubjectId>,
    pub commission_id: Option<CommissionId>,
    pub professor_id: Option<UserId>,
    #[validate(range(min = 1, max = 7, message = "Day of week must be between 1 (Monday) and 7 (Sunday)"))]
    pub day_of_week: Option<i64>,
    pub start_time: Option<ClassTime>,
    pub end_time: Option<ClassTime>,
    /// `null` removes the classroom
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(length(min = 1, max = 50))]
    pub classroom: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub subject_id: Option<SubjectId>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub commission_id: Option<CommissionId>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub professor_id: Option<UserId>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub day_of_week: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub classroom: Option<String>,
}
