//! Session recording and revocation

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::session::Session,
    models::user::UserClaims,
    repository::Repository,
    services::redis::RedisService,
};

#[derive(Clone)]
pub struct SessionsService {
    repository: Repository,
    redis: RedisService,
}

impl SessionsService {
    pub fn new(repository: Repository, redis: RedisService) -> Self {
        Self { repository, redis }
    }

    /// Record the session backing a freshly issued token
    pub async fn record_login(&self, claims: &UserClaims) -> AppResult<Session> {
        self.repository
            .sessions
            .create(
                claims.user_id,
                claims.jti,
                claims.issued_at(),
                claims.expires_at(),
            )
            .await
    }

    /// List a user's sessions that are neither revoked nor expired
    pub async fn active_sessions_for_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        self.repository
            .sessions
            .active_for_user(user_id, Utc::now())
            .await
    }

    /// Revoke a token by identifier: mark the session row and denylist the
    /// jti for the token's remaining lifetime so live JWTs are rejected.
    pub async fn revoke_token(&self, session: &Session) -> AppResult<()> {
        let now = Utc::now();
        let revoked = self
            .repository
            .sessions
            .revoke(session.access_token_jti, now)
            .await?;

        let remaining = (session.expires_at - now).num_seconds();
        if remaining > 0 {
            self.redis
                .denylist_token(session.access_token_jti, remaining as u64)
                .await?;
        }

        if revoked {
            tracing::info!(jti = %session.access_token_jti, user_id = %session.user_id, "Session revoked");
        }

        Ok(())
    }

    /// Check the denylist for a token identifier
    pub async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool> {
        self.redis.is_token_denylisted(jti).await
    }
}
