use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use cuaderno_core::serde::{deserialize_nullable, deserialize_optional, deserialize_optional_string};
use cuaderno_core::{PaginationMeta, PaginationParams};

use crate::ids::SubjectId;

/// An academic subject (materia) taught in a given year of the programme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: SubjectId,
    #[schema(example = "MAT101")]
    pub code: String,
    #[schema(example = "Análisis Matemático I")]
    pub name: String,
    pub description: Option<String>,
    /// Year of the programme, 1 to 6
    pub year: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectDto {
    #[validate(length(min = 1, max = 20, message = "Code must be 1-20 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 150, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 6, message = "Year must be between 1 and 6"))]
    pub year: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSubjectDto {
    #[validate(length(min = 1, max = 20, message = "Code must be 1-20 characters"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(range(min = 1, max = 6, message = "Year must be between 1 and 6"))]
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubjectFilterParams {
    /// Matches name or code
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub year: Option<i64>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedSubjectsResponse {
    pub data: Vec<Subject>,
    pub meta: PaginationMeta,
}
