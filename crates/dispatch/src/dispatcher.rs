//! The notification dispatcher.
//!
//! One request shape drives every send path. The per-user path is the core:
//! filter by preferences, resolve active tokens, record a PENDING history
//! row, fan out through the gateway, prune dead tokens, and settle the row
//! to SENT or FAILED. Batch, topic, and raw-token variants are built on top.

use std::sync::Arc;

use courier_core::types::{CampaignType, DbId, NotificationType};
use courier_db::repositories::{CampaignRepo, DeviceTokenRepo, NotificationRepo, UserRepo};
use courier_gateway::{coerce_data, PushGateway, PushMessage};
use sqlx::PgPool;

use crate::campaign::CampaignTracker;
use crate::preferences::PreferenceFilter;
use crate::result::{
    BatchDispatchResult, SkipReason, TokenBlastResult, TopicSendResult, UserDispatchResult,
};
use crate::DispatchError;

/// What to send, independent of the target.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    pub image_url: Option<String>,
}

impl DispatchRequest {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            title: title.into(),
            body: body.into(),
            data: None,
            image_url: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Build the wire message. The notification type always rides along in
    /// the data payload so clients can route taps; the history row id is
    /// added when one exists.
    fn message(&self, notification_id: Option<DbId>) -> PushMessage {
        let mut data = coerce_data(self.data.as_ref());
        data.insert("type".to_string(), self.notification_type.as_str().to_string());
        if let Some(id) = notification_id {
            data.insert("notification_id".to_string(), id.to_string());
        }
        PushMessage::new(&self.title, &self.body)
            .with_data(data)
            .with_image_url(self.image_url.clone())
    }
}

/// Campaign metadata for a batch dispatch that should be tracked.
#[derive(Debug, Clone)]
pub struct CampaignSeed {
    pub title: String,
    pub description: Option<String>,
    pub campaign_type: CampaignType,
    pub created_by: Option<DbId>,
}

/// Orchestrates sends across the store, the preference filter, and the
/// gateway. Cheap to clone; shared as application state.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: PgPool,
    gateway: Arc<dyn PushGateway>,
}

impl NotificationDispatcher {
    pub fn new(pool: PgPool, gateway: Arc<dyn PushGateway>) -> Self {
        Self { pool, gateway }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn gateway(&self) -> &dyn PushGateway {
        self.gateway.as_ref()
    }

    /// Dispatch one notification to one user.
    ///
    /// Preference-suppressed and device-less dispatches return a skip result
    /// without creating a history row. Otherwise the row is created PENDING
    /// before the gateway is contacted, so a delivery attempt is recorded
    /// even when every send fails, and settled to SENT or FAILED afterwards.
    /// Tokens classified permanently invalid are deactivated regardless of
    /// overall success.
    pub async fn dispatch_to_user(
        &self,
        user_id: DbId,
        request: &DispatchRequest,
        campaign_id: Option<DbId>,
    ) -> Result<UserDispatchResult, DispatchError> {
        if !PreferenceFilter::should_send(&self.pool, user_id, request.notification_type).await? {
            tracing::debug!(user_id, "Dispatch suppressed by preferences");
            return Ok(UserDispatchResult::skipped(user_id, SkipReason::Preferences));
        }

        let tokens = DeviceTokenRepo::active_tokens_for(&self.pool, user_id).await?;
        if tokens.is_empty() {
            tracing::debug!(user_id, "No active devices; skipping dispatch");
            return Ok(UserDispatchResult::skipped(user_id, SkipReason::NoDevices));
        }

        let notification = NotificationRepo::create(
            &self.pool,
            user_id,
            request.notification_type.as_str(),
            &request.title,
            &request.body,
            request.data.as_ref(),
            campaign_id,
        )
        .await?;

        let message = request.message(Some(notification.id));
        let outcome = self.gateway.send_multicast(&tokens, &message).await;

        let invalid = outcome.invalid_tokens();
        if !invalid.is_empty() {
            let removed = DeviceTokenRepo::deactivate_many(&self.pool, &invalid).await?;
            tracing::info!(user_id, removed, "Deactivated invalid device tokens");
        }

        if outcome.success_count > 0 {
            NotificationRepo::mark_sent(&self.pool, notification.id, outcome.first_message_id())
                .await?;
        } else {
            let error = outcome.first_error().unwrap_or("all sends failed");
            NotificationRepo::mark_failed(&self.pool, notification.id, error).await?;
        }

        Ok(UserDispatchResult::from_outcome(
            user_id,
            notification.id,
            tokens.len(),
            &outcome,
        ))
    }

    /// Dispatch to a list of users, optionally tracked as a campaign.
    ///
    /// Unknown and inactive user ids are dropped up front; the campaign's
    /// `total_users` counts the users actually attempted. Users are processed
    /// sequentially and an infrastructure error for one user is counted as a
    /// failure rather than aborting the batch. When a campaign was created,
    /// its statistics are finalized after the loop.
    pub async fn dispatch_to_users(
        &self,
        user_ids: &[DbId],
        request: &DispatchRequest,
        campaign: Option<CampaignSeed>,
    ) -> Result<BatchDispatchResult, DispatchError> {
        let users = UserRepo::list_active_by_ids(&self.pool, user_ids).await?;

        let campaign_id = match campaign {
            Some(seed) => {
                let created = CampaignRepo::create(
                    &self.pool,
                    &seed.title,
                    seed.description.as_deref(),
                    seed.campaign_type.as_str(),
                    seed.created_by,
                    users.len() as i64,
                )
                .await?;
                Some(created.id)
            }
            None => None,
        };

        let mut batch = BatchDispatchResult {
            campaign_id,
            ..Default::default()
        };

        for user in &users {
            match self.dispatch_to_user(user.id, request, campaign_id).await {
                Ok(result) => batch.absorb(&result),
                Err(e) => {
                    tracing::warn!(user_id = user.id, error = %e, "Per-user dispatch failed");
                    batch.absorb_error();
                }
            }
        }

        if let Some(id) = campaign_id {
            CampaignTracker::finalize(&self.pool, id).await?;
        }

        tracing::info!(
            total = batch.total_users,
            successful = batch.successful_users,
            failed = batch.failed_users,
            skipped = batch.skipped_users,
            "Batch dispatch completed"
        );
        Ok(batch)
    }

    /// Broadcast to a topic. Recipients are unknown to the server, so no
    /// history rows are created and preferences do not apply.
    pub async fn dispatch_to_topic(&self, topic: &str, request: &DispatchRequest) -> TopicSendResult {
        match self.gateway.send_to_topic(topic, &request.message(None)).await {
            Ok(message_id) => TopicSendResult {
                success: true,
                message_id: Some(message_id),
                error: None,
            },
            Err(failure) => TopicSendResult {
                success: false,
                message_id: None,
                error: Some(failure.to_string()),
            },
        }
    }

    /// Blast a message at an explicit token list, bypassing preferences and
    /// ownership. Invalid tokens are still deactivated.
    pub async fn dispatch_to_tokens(
        &self,
        tokens: &[String],
        request: &DispatchRequest,
    ) -> Result<TokenBlastResult, DispatchError> {
        let outcome = self.gateway.send_multicast(tokens, &request.message(None)).await;

        let invalid = outcome.invalid_tokens();
        if !invalid.is_empty() {
            let removed = DeviceTokenRepo::deactivate_many(&self.pool, &invalid).await?;
            tracing::info!(removed, "Deactivated invalid device tokens");
        }

        Ok(TokenBlastResult {
            success_count: outcome.success_count,
            failure_count: outcome.failure_count,
            invalid_tokens: invalid,
        })
    }

    /// Dispatch to every active admin, the default target population when a
    /// send request names none.
    pub async fn send_to_all_admins(
        &self,
        request: &DispatchRequest,
    ) -> Result<BatchDispatchResult, DispatchError> {
        let admins = UserRepo::list_active_admins(&self.pool).await?;
        let ids: Vec<DbId> = admins.iter().map(|u| u.id).collect();
        self.dispatch_to_users(&ids, request, None).await
    }
}
