//! Commissions (comisiones): course sections of a subject, plus the
//! enrollment of students into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use cuaderno_core::serde::deserialize_optional;
use cuaderno_core::{PaginationMeta, PaginationParams};

use crate::ids::{CommissionId, SubjectId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Afternoon => "afternoon",
            Shift::Night => "night",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(Shift::Morning),
            "afternoon" => Ok(Shift::Afternoon),
            "night" => Ok(Shift::Night),
            other => Err(format!("Invalid shift: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Commission {
    pub id: CommissionId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    #[schema(example = "K1021")]
    pub name: String,
    /// Academic year the commission runs in
    #[schema(example = 2025)]
    pub year: i64,
    pub shift: Shift,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCommissionDto {
    pub subject_id: SubjectId,
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i64,
    pub shift: Shift,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCommissionDto {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: Option<i64>,
    pub shift: Option<Shift>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommissionFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub subject_id: Option<SubjectId>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub shift: Option<Shift>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedCommissionsResponse {
    pub data: Vec<Commission>,
    pub meta: PaginationMeta,
}

/// A student enrolled in a commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EnrolledStudent {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EnrollStudentsDto {
    #[validate(length(min = 1, message = "At least one student is required"))]
    pub student_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    /// Students newly enrolled by this request
    pub enrolled_count: usize,
    /// Students that were already enrolled
    pub already_enrolled_count: usize,
    /// Ids that do not belong to a student account
    pub invalid_ids: Vec<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_parse_and_serde() {
        assert_eq!("Night".parse::<Shift>().unwrap(), Shift::Night);
        assert!("evening".parse::<Shift>().is_err());
        assert_eq!(serde_json::to_string(&Shift::Afternoon).unwrap(), r#""afternoon""#);
    }

    #[test]
    fn test_create_commission_validation() {
        let dto: CreateCommissionDto = serde_json::from_str(
            r#"{"subject_id":1,"name":"K1021","year":2025,"shift":"morning"}"#,
        )
        .unwrap();
        assert!(dto.validate().is_ok());

        let bad_year = CreateCommissionDto { year: 1999, ..dto };
        assert!(bad_year.validate().is_err());
    }

    #[test]
    fn test_create_commission_rejects_unknown_shift() {
        let result: Result<CreateCommissionDto, _> = serde_json::from_str(
            r#"{"subject_id":1,"name":"K1021","year":2025,"shift":"evening"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_enroll_requires_students() {
        let dto = EnrollStudentsDto {
            student_ids: vec![],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_filter_params() {
        let params: CommissionFilterParams =
            serde_json::from_str(r#"{"subject_id":"4","shift":"night"}"#).unwrap();
        assert_eq!(params.subject_id, Some(SubjectId::new(4)));
        assert_eq!(params.shift, Some(Shift::Night));
        assert_eq!(params.year, None);
    }
}
