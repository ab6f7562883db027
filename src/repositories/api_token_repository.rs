use crate::models::ApiToken;
use chrono::NaiveDateTime;
use sqlx::{Result as SqlxResult, SqlitePool};
use uuid::Uuid;

/// Repository for issued API tokens (digests only)
pub struct ApiTokenRepository {
    pool: SqlitePool,
}

impl ApiTokenRepository {
    /// Create a new ApiTokenRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a freshly issued token digest for a user
    pub async fn create(
        &self,
        user_id: &str,
        token_hash: &str,
        now: NaiveDateTime,
    ) -> SqlxResult<ApiToken> {
        sqlx::query_as::<_, ApiToken>(
            r#"
            INSERT INTO api_tokens (id, user_id, token_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, token_hash, created_at, last_used_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(token_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Look up a token by its digest
    pub async fn find_by_hash(&self, token_hash: &str) -> SqlxResult<Option<ApiToken>> {
        sqlx::query_as::<_, ApiToken>(
            r#"
            SELECT id, user_id, token_hash, created_at, last_used_at
            FROM api_tokens
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// Stamp the token's last use
    pub async fn touch_last_used(&self, id: &str, now: NaiveDateTime) -> SqlxResult<()> {
        sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Revoke a token for a user
    pub async fn revoke(&self, user_id: &str, token_hash: &str) -> SqlxResult<bool> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE user_id = ? AND token_hash = ?")
            .bind(user_id)
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
