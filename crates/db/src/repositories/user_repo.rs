//! Repository for the `users` table.
//!
//! User management lives outside this service; these queries only resolve
//! dispatch target populations and ownership.

use courier_core::roles::ROLE_ADMIN;
use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, username, email, role, is_active, created_at";

/// Read-only queries over users.
pub struct UserRepo;

impl UserRepo {
    /// Fetch a user by id.
    pub async fn get(pool: &PgPool, user_id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Active users among the given ids, preserving no particular order.
    ///
    /// Unknown and inactive ids are silently dropped from the result.
    pub async fn list_active_by_ids(
        pool: &PgPool,
        user_ids: &[DbId],
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE id = ANY($1) AND is_active = true ORDER BY id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await
    }

    /// All active admin users -- the default target population when a send
    /// request names no target.
    pub async fn list_active_admins(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE role = $1 AND is_active = true ORDER BY id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(ROLE_ADMIN)
            .fetch_all(pool)
            .await
    }

    /// All users reachable by push: active users with at least one active
    /// device token. Campaign blasts target this derived population.
    pub async fn list_with_active_tokens(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT DISTINCT u.id, u.username, u.email, u.role, u.is_active, u.created_at \
             FROM users u \
             JOIN device_tokens dt ON dt.user_id = u.id AND dt.is_active = true \
             WHERE u.is_active = true \
             ORDER BY u.id",
        )
        .fetch_all(pool)
        .await
    }
}
