//! User domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use cuaderno_auth::UserRole;
use cuaderno_core::serde::{deserialize_optional, deserialize_optional_string};
use cuaderno_core::{PaginationMeta, PaginationParams};

use crate::ids::UserId;

/// A user as returned by the API. The password hash never leaves the
/// database layer.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    /// Whether notification emails are sent to this user
    pub email_notifications: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// User row including the password hash, used by login and password changes.
#[derive(FromRow, Debug, Clone)]
pub struct UserCredentials {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// DTO for creating a user from the admin panel.
#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Defaults to `student`
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// DTO for updating any user (admin only). Absent fields are left unchanged.
#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub email_notifications: Option<bool>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// DTO for updating the caller's own profile.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub email_notifications: Option<bool>,
}

/// DTO for changing the caller's password.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "Current password is required"))]
    #[serde(alias = "old_password")]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "newPassword123")]
    pub new_password: String,
}

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub role: Option<UserRole>,
    /// Matches first name, last name or email
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}
