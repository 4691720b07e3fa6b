//! Repository for the `notification_preferences` table.

use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::preference::{NotificationPreference, UpdatePreference};

/// Column list for `notification_preferences` queries.
const COLUMNS: &str = "id, user_id, enabled, sale_notifications, product_notifications, \
    report_notifications, ml_notifications, system_notifications, \
    quiet_hours_start, quiet_hours_end, created_at, updated_at";

/// Provides CRUD operations for per-user notification preferences.
pub struct PreferenceRepo;

impl PreferenceRepo {
    /// Get the user's preference row, creating the all-enabled default row
    /// if none exists.
    ///
    /// This is a side-effecting read; the preference filter is the only
    /// dispatch-path component that calls it. The no-op `DO UPDATE` keeps the
    /// statement a single round-trip that always returns the row.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<NotificationPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Partially update a user's preferences; absent fields are unchanged.
    ///
    /// Quiet-hours bounds distinguish "absent" (keep) from explicit `null`
    /// (clear), so a user can remove a configured window.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        update: &UpdatePreference,
    ) -> Result<NotificationPreference, sqlx::Error> {
        // Ensure the row exists before patching it.
        Self::get_or_create(pool, user_id).await?;

        let query = format!(
            "UPDATE notification_preferences SET \
                enabled = COALESCE($2, enabled), \
                sale_notifications = COALESCE($3, sale_notifications), \
                product_notifications = COALESCE($4, product_notifications), \
                report_notifications = COALESCE($5, report_notifications), \
                ml_notifications = COALESCE($6, ml_notifications), \
                system_notifications = COALESCE($7, system_notifications), \
                quiet_hours_start = CASE WHEN $8 THEN $9 ELSE quiet_hours_start END, \
                quiet_hours_end = CASE WHEN $10 THEN $11 ELSE quiet_hours_end END, \
                updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .bind(update.enabled)
            .bind(update.sale_notifications)
            .bind(update.product_notifications)
            .bind(update.report_notifications)
            .bind(update.ml_notifications)
            .bind(update.system_notifications)
            .bind(update.quiet_hours_start.is_some())
            .bind(update.quiet_hours_start.flatten())
            .bind(update.quiet_hours_end.is_some())
            .bind(update.quiet_hours_end.flatten())
            .fetch_one(pool)
            .await
    }
}
