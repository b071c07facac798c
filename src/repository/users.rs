//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, User, UserChanges},
};

use super::map_unique_violation;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID, regardless of active state
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email, regardless of active state
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Get active user by email (primary authentication lookup)
    pub async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND is_active = TRUE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by username, regardless of active state
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id != $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Check if username already exists
    pub async fn username_exists(
        &self,
        username: &str,
        exclude_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) AND id != $2)",
            )
            .bind(username)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
            )
            .bind(username)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    /// List all active users
    pub async fn list_active(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE is_active = TRUE ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Create a new user
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password, phone_number, date_of_birth)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(password_hash)
        .bind(&user.phone_number)
        .bind(user.date_of_birth)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Email or username already in use"))?;

        Ok(created)
    }

    /// Apply a partial-field profile update. Only the fields present in
    /// `changes` are written; last_updated_at is always stamped.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UserChanges,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let now = Utc::now();

        // Build dynamic update query
        let mut sets = vec!["last_updated_at = $1".to_string()];
        let mut param_idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(changes.username, "username");
        add_field!(changes.phone_number, "phone_number");
        add_field!(changes.date_of_birth, "date_of_birth");
        add_field!(password_hash, "password");

        let query = format!(
            "UPDATE users SET {} WHERE id = ${}",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.username);
        bind_field!(changes.phone_number);
        bind_field!(changes.date_of_birth);
        bind_field!(password_hash);

        builder
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Username already in use"))?;

        self.get_by_id(id).await
    }

    /// Replace the email
    pub async fn update_email(&self, id: Uuid, email: &str) -> AppResult<User> {
        sqlx::query("UPDATE users SET email = $1, last_updated_at = $2 WHERE id = $3")
            .bind(email)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Email already in use"))?;

        self.get_by_id(id).await
    }

    /// Replace the username
    pub async fn update_username(&self, id: Uuid, username: &str) -> AppResult<User> {
        sqlx::query("UPDATE users SET username = $1, last_updated_at = $2 WHERE id = $3")
            .bind(username)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Username already in use"))?;

        self.get_by_id(id).await
    }

    /// Replace the password hash
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<User> {
        sqlx::query("UPDATE users SET password = $1, last_updated_at = $2 WHERE id = $3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_by_id(id).await
    }

    /// Flip the active flag by email. Idempotent; the caller re-reads to
    /// confirm the post-state.
    pub async fn set_active_by_email(&self, email: &str, active: bool) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET is_active = $1, last_updated_at = $2 WHERE LOWER(email) = LOWER($3)",
        )
        .bind(active)
        .bind(Utc::now())
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flip the admin flag by email. Idempotent; the caller re-reads to
    /// confirm the post-state.
    pub async fn set_admin_by_email(&self, email: &str, is_admin: bool) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET is_admin = $1, last_updated_at = $2 WHERE LOWER(email) = LOWER($3)",
        )
        .bind(is_admin)
        .bind(Utc::now())
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
