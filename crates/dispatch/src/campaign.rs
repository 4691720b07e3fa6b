//! Campaign bookkeeping.

use courier_core::types::{DbId, NotificationStatus};
use courier_db::models::campaign::NotificationCampaign;
use courier_db::repositories::{CampaignRepo, NotificationRepo, UserRepo};
use sqlx::PgPool;

use crate::dispatcher::{DispatchRequest, NotificationDispatcher};
use crate::result::BatchDispatchResult;
use crate::DispatchError;

/// Statistics and population handling for tracked sends.
pub struct CampaignTracker;

impl CampaignTracker {
    /// Recompute a campaign's delivery statistics from its notification rows
    /// and mark it completed.
    ///
    /// Counts are derived, not incremented, so finalizing twice (or after a
    /// partial batch) converges on the truth in the notifications table.
    pub async fn finalize(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<NotificationCampaign, DispatchError> {
        let sent =
            NotificationRepo::count_for_campaign_by_status(pool, campaign_id, NotificationStatus::Sent)
                .await?;
        let failed = NotificationRepo::count_for_campaign_by_status(
            pool,
            campaign_id,
            NotificationStatus::Failed,
        )
        .await?;

        let campaign = CampaignRepo::set_statistics(pool, campaign_id, sent, failed).await?;
        tracing::info!(
            campaign_id,
            sent,
            failed,
            success_rate = campaign.success_rate(),
            "Campaign finalized"
        );
        Ok(campaign)
    }

    /// Send a campaign to every reachable user: active users with at least
    /// one active device token.
    ///
    /// The campaign row must already exist; its `total_users` is overwritten
    /// with the derived population size before dispatch begins.
    pub async fn send_campaign_to_all_devices(
        dispatcher: &NotificationDispatcher,
        campaign_id: DbId,
        request: &DispatchRequest,
    ) -> Result<BatchDispatchResult, DispatchError> {
        let pool = dispatcher.pool();

        let campaign = CampaignRepo::get(pool, campaign_id)
            .await?
            .ok_or(DispatchError::CampaignNotFound(campaign_id))?;

        let users = UserRepo::list_with_active_tokens(pool).await?;
        CampaignRepo::set_total_users(pool, campaign.id, users.len() as i64).await?;

        let ids: Vec<DbId> = users.iter().map(|u| u.id).collect();
        let mut batch = BatchDispatchResult {
            campaign_id: Some(campaign.id),
            ..Default::default()
        };

        for user_id in ids {
            match dispatcher.dispatch_to_user(user_id, request, Some(campaign.id)).await {
                Ok(result) => batch.absorb(&result),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Per-user campaign dispatch failed");
                    batch.absorb_error();
                }
            }
        }

        Self::finalize(pool, campaign.id).await?;
        Ok(batch)
    }
}
