//! Grades (notas) recorded against evaluations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use cuaderno_core::serde::deserialize_optional;

use crate::evaluations::EvaluationKind;
use crate::ids::{EvaluationId, GradeId, SubjectId, UserId};

/// A grade as seen by the professor grading an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: GradeId,
    pub evaluation_id: EvaluationId,
    pub student_id: UserId,
    pub student_first_name: String,
    pub student_last_name: String,
    pub score: f64,
    pub feedback: Option<String>,
    pub graded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A grade as seen by the student who received it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentGrade {
    pub id: GradeId,
    pub evaluation_id: EvaluationId,
    pub evaluation_title: String,
    pub kind: EvaluationKind,
    pub scheduled_for: NaiveDate,
    pub max_score: f64,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub score: f64,
    pub feedback: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Per-subject aggregate of a student's grades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubjectGradeSummary {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub evaluations_graded: i64,
    /// Mean of the scores rescaled to 0..10, rounded to two decimals
    pub average_score: f64,
}

fn validate_score(score: f64) -> Result<(), ValidationError> {
    if !score.is_finite() || score < 0.0 {
        let mut error = ValidationError::new("score");
        error.message = Some("Score must be zero or greater".into());
        return Err(error);
    }
    Ok(())
}

fn validate_entry_score(entry: &GradeEntry) -> Result<(), ValidationError> {
    validate_score(entry.score)
}

/// One row of a batch grade submission. The upper bound of `score` depends
/// on the evaluation and is checked by the service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_entry_score"))]
pub struct GradeEntry {
    pub student_id: UserId,
    #[schema(example = 8.5)]
    pub score: f64,
    #[validate(length(max = 1000))]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordGradesDto {
    #[validate(length(min = 1, message = "At least one grade is required"), nested)]
    pub grades: Vec<GradeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordGradesResponse {
    pub recorded: usize,
    pub grades: Vec<Grade>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyGradesFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub subject_id: Option<SubjectId>,
}
