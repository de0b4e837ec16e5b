use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use cuaderno_core::serde::{deserialize_nullable, deserialize_optional, deserialize_optional_string};
use cuaderno_core::{PaginationMeta, PaginationParams};

use crate::ids::{ContentId, SubjectId, UserId};

/// A piece of course material published for a subject in a given week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Content {
    pub id: ContentId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    /// Week of the course, 1 to 52
    pub week_number: i64,
    pub title: String,
    pub body: String,
    pub resource_url: Option<String>,
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyContent {
    pub week_number: i64,
    pub contents: Vec<Content>,
}

/// Groups contents by week number in ascending order. Within a week the
/// incoming order is kept.
pub fn group_by_week(contents: Vec<Content>) -> Vec<WeeklyContent> {
    let mut weeks: Vec<WeeklyContent> = Vec::new();
    for content in contents {
        match weeks.iter_mut().find(|w| w.week_number == content.week_number) {
            Some(week) => week.contents.push(content),
            None => weeks.push(WeeklyContent {
                week_number: content.week_number,
                contents: vec![content],
            }),
        }
    }
    weeks.sort_by_key(|w| w.week_number);
    weeks
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateContentDto {
    pub subject_id: SubjectId,
    #[validate(range(min = 1, max = 52, message = "Week number must be between 1 and 52"))]
    pub week_number: i64,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
    #[validate(url(message = "Resource URL must be a valid URL"))]
    pub resource_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateContentDto {
    #[validate(range(min = 1, max = 52, message = "Week number must be between 1 and 52"))]
    pub week_number: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    /// `null` removes the link
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(url(message = "Resource URL must be a valid URL"))]
    pub resource_url: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub subject_id: Option<SubjectId>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub week_number: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub author_id: Option<UserId>,
    /// Matches title or body
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedContentsResponse {
    pub data: Vec<Content>,
    pub meta: PaginationMeta,
}
