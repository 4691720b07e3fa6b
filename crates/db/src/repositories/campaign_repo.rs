//! Repository for the `notification_campaigns` table.

use courier_core::types::DbId;
use sqlx::PgPool;

use crate::models::campaign::NotificationCampaign;

/// Column list for `notification_campaigns` queries.
const COLUMNS: &str = "id, title, description, campaign_type, created_by, total_users, \
    successful_sends, failed_sends, is_completed, created_at, updated_at";

/// Provides CRUD operations for notification campaigns.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Create a campaign before dispatch begins, so `total_users` is known
    /// up front.
    pub async fn create(
        pool: &PgPool,
        title: &str,
        description: Option<&str>,
        campaign_type: &str,
        created_by: Option<DbId>,
        total_users: i64,
    ) -> Result<NotificationCampaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_campaigns \
                (title, description, campaign_type, created_by, total_users) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationCampaign>(&query)
            .bind(title)
            .bind(description)
            .bind(campaign_type)
            .bind(created_by)
            .bind(total_users)
            .fetch_one(pool)
            .await
    }

    /// Fetch a campaign by id.
    pub async fn get(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Option<NotificationCampaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_campaigns WHERE id = $1");
        sqlx::query_as::<_, NotificationCampaign>(&query)
            .bind(campaign_id)
            .fetch_optional(pool)
            .await
    }

    /// List campaigns, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationCampaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_campaigns \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, NotificationCampaign>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Write recomputed delivery statistics and mark the campaign completed.
    pub async fn set_statistics(
        pool: &PgPool,
        campaign_id: DbId,
        successful_sends: i64,
        failed_sends: i64,
    ) -> Result<NotificationCampaign, sqlx::Error> {
        let query = format!(
            "UPDATE notification_campaigns \
             SET successful_sends = $2, failed_sends = $3, is_completed = true, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationCampaign>(&query)
            .bind(campaign_id)
            .bind(successful_sends)
            .bind(failed_sends)
            .fetch_one(pool)
            .await
    }

    /// Update the target-population size of a campaign.
    ///
    /// Used when a pre-created campaign is later sent to a derived
    /// population (all reachable users) rather than a caller-supplied list.
    pub async fn set_total_users(
        pool: &PgPool,
        campaign_id: DbId,
        total_users: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_campaigns \
             SET total_users = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(campaign_id)
        .bind(total_users)
        .execute(pool)
        .await?;
        Ok(())
    }
}
