use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role stored on `users.role` and embedded in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Professor,
    Student,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::Professor, UserRole::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Professor => "professor",
            UserRole::Student => "student",
        }
    }

    /// Admins and professors may author content, evaluations and grades.
    pub fn can_teach(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Professor)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "professor" => Ok(UserRole::Professor),
            "student" => Ok(UserRole::Student),
            other => Err(format!("Invalid role: {other}")),
        }
    }
}
