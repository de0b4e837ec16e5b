//! JWT claim structures for authentication tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cuaderno_core::AppError;

use crate::roles::UserRole;

/// JWT claims for access tokens.
///
/// Carries everything the role guards need so that authorization does not
/// touch the database.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// Numeric user id from the subject claim.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid token subject".to_string()))
    }
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token identifier (JWT ID) to ensure token uniqueness
    pub jti: String,
}
