use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use cuaderno_core::search::contains_pattern;
use cuaderno_core::{AppError, PaginationMeta, hash_password, verify_password};

use super::model::{
    ChangePasswordDto, CreateUserDto, PaginatedUsersResponse, UpdateProfileDto, UpdateUserDto,
    User, UserFilterParams, UserId, UserRole,
};

pub(crate) const USER_COLUMNS: &str =
    "id, first_name, last_name, email, role, email_notifications, created_at, updated_at";

fn duplicate_email(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::bad_request(anyhow::anyhow!("A user with this email already exists"));
    }
    AppError::from(e)
}

fn push_user_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &UserFilterParams) {
    builder.push(" WHERE 1 = 1");

    if let Some(role) = filters.role {
        builder.push(" AND role = ").push_bind(role);
    }

    if let Some(search) = &filters.search {
        let pattern = contains_pattern(search);
        builder
            .push(" AND (first_name LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR last_name LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR email LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_user(db: &SqlitePool, dto: CreateUserDto) -> Result<User, AppError> {
        let hashed_password = hash_password(&dto.password)?;
        let role = dto.role.unwrap_or(UserRole::Student);

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, email, password, role)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(dto.email.trim())
        .bind(&hashed_password)
        .bind(role)
        .fetch_one(db)
        .await
        .map_err(duplicate_email)?;

        Ok(user)
    }

    /// Looks a user up without treating absence as an error.
    #[instrument(skip(db))]
    pub async fn find_user(db: &SqlitePool, id: UserId) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(db)
                .await?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &SqlitePool, id: UserId) -> Result<User, AppError> {
        Self::find_user(db, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_users(
        db: &SqlitePool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
        push_user_filters(&mut count_query, &filters);
        let total: i64 = count_query.build_query_scalar().fetch_one(db).await?;

        let mut data_query = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_user_filters(&mut data_query, &filters);
        data_query
            .push(" ORDER BY last_name, first_name, id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let users = data_query.build_query_as::<User>().fetch_all(db).await?;

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn update_user(
        db: &SqlitePool,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(db, id).await?;

        let first_name = dto.first_name.unwrap_or(existing.first_name);
        let last_name = dto.last_name.unwrap_or(existing.last_name);
        let email = dto.email.unwrap_or(existing.email);
        let role = dto.role.unwrap_or(existing.role);
        let email_notifications = dto
            .email_notifications
            .unwrap_or(existing.email_notifications);

        let mut tx = db.begin().await?;

        if let Some(password) = &dto.password {
            let hashed_password = hash_password(password)?;
            sqlx::query("UPDATE users SET password = ? WHERE id = ?")
                .bind(&hashed_password)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = ?, last_name = ?, email = ?, role = ?, email_notifications = ?,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING {USER_COLUMNS}"
        ))
        .bind(first_name.trim())
        .bind(last_name.trim())
        .bind(email.trim())
        .bind(role)
        .bind(email_notifications)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(duplicate_email)?;

        tx.commit().await?;

        Ok(user)
    }

    /// Deletes a user. Admins cannot delete their own account.
    #[instrument(skip(db))]
    pub async fn delete_user(
        db: &SqlitePool,
        id: UserId,
        acting_user_id: UserId,
    ) -> Result<(), AppError> {
        if id == acting_user_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot delete your own account"
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn update_profile(
        db: &SqlitePool,
        id: UserId,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(db, id).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = ?, last_name = ?, email_notifications = ?,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING {USER_COLUMNS}"
        ))
        .bind(
            dto.first_name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.first_name),
        )
        .bind(
            dto.last_name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.last_name),
        )
        .bind(
            dto.email_notifications
                .unwrap_or(existing.email_notifications),
        )
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &SqlitePool,
        id: UserId,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let current_hash: String = sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if !verify_password(&dto.current_password, &current_hash)? {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Current password is incorrect"
            )));
        }

        if dto.current_password == dto.new_password {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "New password must be different from the current password"
            )));
        }

        let hashed_password = hash_password(&dto.new_password)?;

        sqlx::query("UPDATE users SET password = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(&hashed_password)
            .bind(id)
            .execute(db)
            .await?;

        Ok(())
    }

    /// Returns the subset of `ids` that belong to users with `role`, in the
    /// order given and without duplicates.
    #[instrument(skip(db))]
    pub async fn ids_with_role(
        db: &SqlitePool,
        ids: &[UserId],
        role: UserRole,
    ) -> Result<Vec<UserId>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM users WHERE role = ");
        query.push_bind(role).push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let found: Vec<UserId> = query.build_query_scalar().fetch_all(db).await?;

        let mut matching = Vec::with_capacity(found.len());
        for id in ids {
            if found.contains(id) && !matching.contains(id) {
                matching.push(*id);
            }
        }
        Ok(matching)
    }

    #[instrument(skip(db))]
    pub async fn has_role(db: &SqlitePool, id: UserId, role: UserRole) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ? AND role = ?)")
                .bind(id)
                .bind(role)
                .fetch_one(db)
                .await?;

        Ok(exists)
    }
}
