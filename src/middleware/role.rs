//! Role-based authorization.
//!
//! Two ways to guard a route:
//! 1. Route layer: [`require_admin`] with
//!    `axum::middleware::from_fn_with_state`
//! 2. Extractors: [`RequireAdmin`] / [`RequireTeacher`] / [`RequireStudent`]
//!    in the handler signature, which also hand back the [`AuthUser`]
//!
//! "Teacher" means any role that can author academic material: professors
//! and admins.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use cuaderno_auth::UserRole;
use cuaderno_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const ADMIN_ROLES: &[UserRole] = &[UserRole::Admin];

/// Route layer that lets the request through only for admins.
///
/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/", post(create_user))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let auth_user = match AuthUser::from_request_parts(&mut parts, &state).await {
        Ok(auth_user) => auth_user,
        Err(err) => return err.into_response(),
    };
    if let Err(err) = check_any_role(&auth_user, ADMIN_ROLES) {
        return err.into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}

/// Extractor for admin-only handlers.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if !auth_user.is_admin() {
            return Err(AppError::forbidden(
                "Access denied. Administrator privileges required.".to_string(),
            ));
        }

        Ok(RequireAdmin(auth_user))
    }
}

/// Extractor for professor or admin handlers.
#[derive(Debug, Clone)]
pub struct RequireTeacher(pub AuthUser);

impl FromRequestParts<AppState> for RequireTeacher {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if !auth_user.role().can_teach() {
            return Err(AppError::forbidden(
                "Access denied. Professor privileges required.".to_string(),
            ));
        }

        Ok(RequireTeacher(auth_user))
    }
}

/// Extractor for handlers that only make sense for students.
#[derive(Debug, Clone)]
pub struct RequireStudent(pub AuthUser);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_role(&auth_user, UserRole::Student)?;
        Ok(RequireStudent(auth_user))
    }
}

pub fn check_role(auth_user: &AuthUser, required_role: UserRole) -> Result<(), AppError> {
    check_any_role(auth_user, &[required_role])
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    let user_role = auth_user.role();

    if !allowed_roles.contains(&user_role) {
        let required = allowed_roles
            .iter()
            .map(UserRole::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AppError::forbidden(format!(
            "Access denied. Required roles: {}, but user has role: {}",
            required, user_role
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuaderno_auth::Claims;

    const TEACHER_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Professor];

    fn auth_user(role: UserRole) -> AuthUser {
        AuthUser(Claims {
            sub: "1".to_string(),
            email: "user@example.com".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_check_role() {
        assert!(check_role(&auth_user(UserRole::Student), UserRole::Student).is_ok());
        assert!(check_role(&auth_user(UserRole::Admin), UserRole::Student).is_err());
    }

    #[test]
    fn test_check_any_role_teacher_roles() {
        assert!(check_any_role(&auth_user(UserRole::Admin), TEACHER_ROLES).is_ok());
        assert!(check_any_role(&auth_user(UserRole::Professor), TEACHER_ROLES).is_ok());

        let err = check_any_role(&auth_user(UserRole::Student), TEACHER_ROLES).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
        assert!(err.error.to_string().contains("admin, professor"));
    }

    #[test]
    fn test_admin_roles_exclude_professor() {
        assert!(check_any_role(&auth_user(UserRole::Professor), ADMIN_ROLES).is_err());
    }
}
