//! Redis service for the revoked-token denylist

use redis::{AsyncCommands, Client};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    /// Denylist a token identifier until its natural expiry (in seconds)
    pub async fn denylist_token(&self, jti: Uuid, expiration_seconds: u64) -> AppResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        let key = format!("revoked_jti:{}", jti);
        conn.set_ex::<_, _, ()>(&key, "1", expiration_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to denylist token in Redis: {}", e)))?;

        Ok(())
    }

    /// Check whether a token identifier has been revoked
    pub async fn is_token_denylisted(&self, jti: Uuid) -> AppResult<bool> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        let key = format!("revoked_jti:{}", jti);
        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to check token in Redis: {}", e)))?;

        Ok(exists)
    }
}
