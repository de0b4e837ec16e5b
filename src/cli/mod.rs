//! Administrative commands behind the `cuaderno-cli` binary.

pub mod seeder;

use sqlx::SqlitePool;
use validator::Validate;

use crate::modules::users::model::{CreateUserDto, User, UserRole};
use crate::modules::users::service::UserService;

/// Creates an admin account. Admins cannot be created through public
/// registration.
pub async fn create_admin(
    db: &SqlitePool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    let dto = CreateUserDto {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role: Some(UserRole::Admin),
    };
    dto.validate()?;

    let user = UserService::create_user(db, dto)
        .await
        .map_err(|e| format!("Failed to create admin: {}", e.error))?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_admin(pool: SqlitePool) {
        let user = create_admin(&pool, "Ada", "Lovelace", "ada@cuaderno.test", "password123")
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Admin);

        let duplicate =
            create_admin(&pool, "Ada", "Lovelace", "ada@cuaderno.test", "password123").await;
        assert!(duplicate.is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_admin_rejects_short_password(pool: SqlitePool) {
        let result = create_admin(&pool, "Ada", "Lovelace", "ada@cuaderno.test", "short").await;
        assert!(result.is_err());
    }
}
