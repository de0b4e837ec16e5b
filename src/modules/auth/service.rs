use sqlx::SqlitePool;
use tracing::instrument;

use cuaderno_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use cuaderno_config::JwtConfig;
use cuaderno_core::{AppError, verify_password};
use cuaderno_models::users::UserCredentials;

use crate::metrics::{track_jwt_issued, track_user_login_failure, track_user_login_success};
use crate::modules::users::model::{CreateUserDto, User, UserId, UserRole};
use crate::modules::users::service::UserService;

use super::model::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest, TokenResponse,
};

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid email or password".to_string())
}

fn issue_tokens(
    user_id: UserId,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<TokenResponse, AppError> {
    let access_token = create_access_token(user_id.into_inner(), email, role, jwt_config)?;
    let refresh_token = create_refresh_token(user_id.into_inner(), email, jwt_config)?;
    track_jwt_issued();

    Ok(TokenResponse {
        access_token,
        refresh_token,
    })
}

pub struct AuthService;

impl AuthService {
    /// Self-service registration always creates a student account.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn register_user(db: &SqlitePool, dto: RegisterRequest) -> Result<User, AppError> {
        UserService::create_user(
            db,
            CreateUserDto {
                first_name: dto.first_name,
                last_name: dto.last_name,
                email: dto.email,
                password: dto.password,
                role: Some(UserRole::Student),
            },
        )
        .await
    }

    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login_user(
        db: &SqlitePool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let Some(credentials) = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, password, role FROM users WHERE email = ?",
        )
        .bind(dto.email.trim())
        .fetch_optional(db)
        .await?
        else {
            track_user_login_failure("unknown_email");
            return Err(invalid_credentials());
        };

        if !verify_password(&dto.password, &credentials.password)? {
            track_user_login_failure("invalid_password");
            return Err(invalid_credentials());
        }

        let tokens = issue_tokens(
            credentials.id,
            &credentials.email,
            credentials.role,
            jwt_config,
        )?;
        let user = UserService::get_user(db, credentials.id).await?;
        track_user_login_success(user.role.as_str());

        Ok(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user,
        })
    }

    /// Exchanges a valid refresh token for a new token pair. The role is
    /// read from the database so a role change takes effect on refresh.
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn refresh_tokens(
        db: &SqlitePool,
        dto: RefreshTokenRequest,
        jwt_config: &JwtConfig,
    ) -> Result<TokenResponse, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid or expired refresh token".to_string()))?;

        let user = UserService::find_user(db, UserId::new(user_id))
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists".to_string()))?;

        issue_tokens(user.id, &user.email, user.role, jwt_config)
    }
}
