//! Sessions repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::session::Session};

#[derive(Clone)]
pub struct SessionsRepository {
    pool: Pool<Postgres>,
}

impl SessionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a freshly issued token
    pub async fn create(
        &self,
        user_id: Uuid,
        access_token_jti: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, access_token_jti, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(access_token_jti)
        .bind(issued_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// List a user's sessions that are neither revoked nor expired,
    /// oldest first
    pub async fn active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT * FROM sessions
            WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2
            ORDER BY issued_at
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Mark the session carrying this token identifier as revoked.
    /// Returns whether a live session was actually revoked.
    pub async fn revoke(&self, access_token_jti: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = $1 WHERE access_token_jti = $2 AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(access_token_jti)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
