use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use cuaderno_auth::{Claims, UserRole, verify_token};
use cuaderno_core::AppError;
use cuaderno_models::UserId;

use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0.user_id().map(UserId::new)
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_claims(sub: &str, role: UserRole) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "test@example.com".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_user_id() {
        let auth_user = AuthUser(create_test_claims("42", UserRole::Professor));
        assert_eq!(auth_user.user_id().unwrap(), UserId::new(42));
        assert_eq!(auth_user.role(), UserRole::Professor);
    }

    #[test]
    fn test_invalid_subject_is_unauthorized() {
        let auth_user = AuthUser(create_test_claims("abc", UserRole::Student));
        let err = auth_user.user_id().unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_is_admin() {
        assert!(AuthUser(create_test_claims("1", UserRole::Admin)).is_admin());
        assert!(!AuthUser(create_test_claims("1", UserRole::Professor)).is_admin());
    }
}
