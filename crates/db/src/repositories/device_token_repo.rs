//! Repository for the `device_tokens` table.

use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::device_token::DeviceToken;

/// Column list for `device_tokens` queries.
const COLUMNS: &str =
    "id, user_id, token, platform, device_name, is_active, created_at, updated_at, last_used";

/// Provides CRUD operations for device tokens.
pub struct DeviceTokenRepo;

impl DeviceTokenRepo {
    /// Insert or update a device token, keyed by the token string.
    ///
    /// Re-registering an existing token string reassigns ownership to the
    /// given user (last-writer-wins), reactivates the token, and refreshes
    /// `last_used`. This mirrors the vendor SDK's behavior where the same
    /// token can surface on a device after an app reinstall under a
    /// different account; a token string never maps to two rows.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        token: &str,
        platform: &str,
        device_name: Option<&str>,
    ) -> Result<DeviceToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_tokens (user_id, token, platform, device_name) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (token) DO UPDATE SET \
                user_id = EXCLUDED.user_id, \
                platform = EXCLUDED.platform, \
                device_name = EXCLUDED.device_name, \
                is_active = true, \
                last_used = NOW(), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceToken>(&query)
            .bind(user_id)
            .bind(token)
            .bind(platform)
            .bind(device_name)
            .fetch_one(pool)
            .await
    }

    /// Deactivate a single token.
    ///
    /// Returns `true` if a row existed, `false` otherwise. Deactivating an
    /// already-inactive or unknown token is not an error.
    pub async fn deactivate(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE device_tokens SET is_active = false, updated_at = NOW() WHERE token = $1",
        )
        .bind(token)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk-deactivate tokens the gateway classified as permanently invalid.
    ///
    /// Tokens that no longer exist are silently skipped; the write is
    /// idempotent so concurrent deactivation of the same token is safe.
    /// Returns the number of rows touched.
    pub async fn deactivate_many(pool: &PgPool, tokens: &[String]) -> Result<u64, sqlx::Error> {
        if tokens.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE device_tokens SET is_active = false, updated_at = NOW() \
             WHERE token = ANY($1)",
        )
        .bind(tokens)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// All active token strings for a user, newest-used first. This is the
    /// fan-out target set for a per-user dispatch.
    pub async fn active_tokens_for(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT token FROM device_tokens \
             WHERE user_id = $1 AND is_active = true \
             ORDER BY last_used DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// List a user's device tokens.
    ///
    /// When `active_only` is `true`, inactive tokens are filtered out.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        active_only: bool,
    ) -> Result<Vec<DeviceToken>, sqlx::Error> {
        let filter = if active_only {
            "AND is_active = true"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM device_tokens \
             WHERE user_id = $1 {filter} \
             ORDER BY last_used DESC"
        );
        sqlx::query_as::<_, DeviceToken>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
