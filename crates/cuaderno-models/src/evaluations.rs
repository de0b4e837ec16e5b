use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use cuaderno_core::serde::{deserialize_nullable, deserialize_optional};
use cuaderno_core::{PaginationMeta, PaginationParams};

use crate::ids::{CommissionId, EvaluationId, SubjectId, UserId};

pub const DEFAULT_MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EvaluationKind {
    Exam,
    Assignment,
    Quiz,
    Project,
}

impl EvaluationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationKind::Exam => "exam",
            EvaluationKind::Assignment => "assignment",
            EvaluationKind::Quiz => "quiz",
            EvaluationKind::Project => "project",
        }
    }
}

impl fmt::Display for EvaluationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exam" => Ok(EvaluationKind::Exam),
            "assignment" => Ok(EvaluationKind::Assignment),
            "quiz" => Ok(EvaluationKind::Quiz),
            "project" => Ok(EvaluationKind::Project),
            other => Err(format!("Invalid evaluation kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub commission_id: Option<CommissionId>,
    pub title: String,
    pub description: Option<String>,
    pub kind: EvaluationKind,
    pub scheduled_for: NaiveDate,
    pub max_score: f64,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_max_score(score: f64) -> Result<(), ValidationError> {
    if !score.is_finite() || score <= 0.0 {
        let mut error = ValidationError::new("max_score");
        error.message = Some("Max score must be greater than 0".into());
        return Err(error);
    }
    Ok(())
}

fn validate_create_max_score(dto: &CreateEvaluationDto) -> Result<(), ValidationError> {
    validate_max_score(dto.max_score)
}

fn validate_update_max_score(dto: &UpdateEvaluationDto) -> Result<(), ValidationError> {
    dto.max_score.map_or(Ok(()), validate_max_score)
}

fn default_max_score() -> f64 {
    DEFAULT_MAX_SCORE
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_max_score"))]
pub struct CreateEvaluationDto {
    pub subject_id: SubjectId,
    /// Restricts the evaluation to one commission of the subject
    pub commission_id: Option<CommissionId>,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub kind: EvaluationKind,
    pub scheduled_for: NaiveDate,
    #[serde(default = "default_max_score")]
    #[schema(default = 10.0)]
    pub max_score: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_max_score"))]
pub struct UpdateEvaluationDto {
    /// `null` opens the evaluation to every commission of the subject
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<i64>)]
    pub commission_id: Option<Option<CommissionId>>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub kind: Option<EvaluationKind>,
    pub scheduled_for: Option<NaiveDate>,
    pub max_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EvaluationFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub subject_id: Option<SubjectId>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub commission_id: Option<CommissionId>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub kind: Option<EvaluationKind>,
    /// Earliest `scheduled_for` date, inclusive
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub from: Option<NaiveDate>,
    /// Latest `scheduled_for` date, inclusive
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedEvaluationsResponse {
    pub data: Vec<Evaluation>,
    pub meta: PaginationMeta,
}
