//! Repository for the `notifications` table.

use courier_core::types::{DbId, NotificationStatus};
use sqlx::PgPool;

use crate::models::notification::{
    CampaignStatusCounts, Notification, NotificationStats, TypeCount,
};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, notification_type, title, body, data, gateway_message_id, \
    campaign_id, status, error_message, sent_at, read_at, created_at, updated_at";

/// Provides CRUD operations for notification history rows.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a PENDING notification for a user, returning the full row.
    ///
    /// Called before the gateway send so a failed delivery attempt is still
    /// recorded.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        notification_type: &str,
        title: &str,
        body: &str,
        data: Option<&serde_json::Value>,
        campaign_id: Option<DbId>,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, notification_type, title, body, data, campaign_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(notification_type)
            .bind(title)
            .bind(body)
            .bind(data)
            .bind(campaign_id)
            .fetch_one(pool)
            .await
    }

    /// Transition a notification to SENT, stamping `sent_at` and the gateway
    /// message id when the gateway reported one.
    pub async fn mark_sent(
        pool: &PgPool,
        notification_id: DbId,
        gateway_message_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notifications \
             SET status = 'SENT', sent_at = NOW(), \
                 gateway_message_id = COALESCE($2, gateway_message_id), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(notification_id)
        .bind(gateway_message_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition a notification to FAILED (terminal) with an explanatory
    /// error message.
    pub async fn mark_failed(
        pool: &PgPool,
        notification_id: DbId,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notifications \
             SET status = 'FAILED', error_message = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(notification_id)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a single notification as read.
    ///
    /// Only SENT notifications can transition to READ; a PENDING or FAILED
    /// row is left untouched and `false` is returned, as it is when the row
    /// does not exist or belongs to another user.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'READ', read_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status = 'SENT'",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all of a user's SENT notifications as read.
    ///
    /// Returns the number of notifications that were marked.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'READ', read_at = NOW(), updated_at = NOW() \
             WHERE user_id = $1 AND status = 'SENT'",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Number of unread (PENDING or SENT) notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND status IN ('PENDING', 'SENT')",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// List notifications for a user, newest first.
    ///
    /// When `unread_only` is `true`, only PENDING and SENT rows are returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND status IN ('PENDING', 'SENT')"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Fetch a single notification scoped to its owner.
    pub async fn get_for_user(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Notification>(&query)
            .bind(notification_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Aggregate per-user statistics: totals plus a by-type breakdown.
    pub async fn stats_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<NotificationStats, sqlx::Error> {
        let (total, unread, sent, failed): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE status IN ('PENDING', 'SENT')), \
                    COUNT(*) FILTER (WHERE status = 'SENT'), \
                    COUNT(*) FILTER (WHERE status = 'FAILED') \
             FROM notifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let by_type = sqlx::query_as::<_, TypeCount>(
            "SELECT notification_type, COUNT(*) AS count \
             FROM notifications WHERE user_id = $1 \
             GROUP BY notification_type ORDER BY count DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(NotificationStats {
            total,
            unread,
            sent,
            failed,
            by_type,
        })
    }

    /// Count a campaign's notifications with the given status.
    pub async fn count_for_campaign_by_status(
        pool: &PgPool,
        campaign_id: DbId,
        status: NotificationStatus,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE campaign_id = $1 AND status = $2",
        )
        .bind(campaign_id)
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Per-status counts for all notifications attached to a campaign.
    pub async fn campaign_status_counts(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<CampaignStatusCounts, sqlx::Error> {
        sqlx::query_as::<_, CampaignStatusCounts>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE status = 'SENT') AS sent, \
                    COUNT(*) FILTER (WHERE status = 'FAILED') AS failed, \
                    COUNT(*) FILTER (WHERE status = 'PENDING') AS pending, \
                    COUNT(*) FILTER (WHERE status = 'READ') AS read \
             FROM notifications WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_one(pool)
        .await
    }

    /// List a campaign's FAILED notifications, newest first.
    pub async fn list_failed_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE campaign_id = $1 AND status = 'FAILED' \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }
}
