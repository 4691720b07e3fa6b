//! Structured dispatch results.
//!
//! Every send path reports what happened as data. The per-user result feeds
//! the batch reducer; both serialize directly into API responses.

use courier_core::types::DbId;
use courier_gateway::MulticastOutcome;
use serde::Serialize;

/// Why a per-user dispatch was skipped without contacting the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Preferences suppress this notification (disabled, category off, or
    /// quiet hours).
    Preferences,
    /// The user has no active device tokens.
    NoDevices,
}

/// Outcome of dispatching one notification to one user.
#[derive(Debug, Serialize)]
pub struct UserDispatchResult {
    pub user_id: DbId,
    /// At least one device received the message.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    /// History row id; absent when the dispatch was skipped before creating
    /// one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<DbId>,
    pub devices_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Tokens the gateway classified as permanently invalid; already
    /// deactivated by the time this result is returned.
    pub invalid_tokens: Vec<String>,
}

impl UserDispatchResult {
    /// A dispatch suppressed before any gateway contact.
    pub fn skipped(user_id: DbId, reason: SkipReason) -> Self {
        Self {
            user_id,
            success: false,
            skipped: Some(reason),
            notification_id: None,
            devices_count: 0,
            success_count: 0,
            failure_count: 0,
            invalid_tokens: Vec::new(),
        }
    }

    /// A dispatch that reached the gateway, summarized from its multicast
    /// outcome.
    pub fn from_outcome(
        user_id: DbId,
        notification_id: DbId,
        devices_count: usize,
        outcome: &MulticastOutcome,
    ) -> Self {
        Self {
            user_id,
            success: outcome.success_count > 0,
            skipped: None,
            notification_id: Some(notification_id),
            devices_count,
            success_count: outcome.success_count,
            failure_count: outcome.failure_count,
            invalid_tokens: outcome.invalid_tokens(),
        }
    }
}

/// Aggregate of a multi-user dispatch.
#[derive(Debug, Default, Serialize)]
pub struct BatchDispatchResult {
    pub total_users: usize,
    pub successful_users: usize,
    pub failed_users: usize,
    pub skipped_users: usize,
    pub total_devices: usize,
    pub successful_sends: usize,
    pub failed_sends: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<DbId>,
}

impl BatchDispatchResult {
    /// Fold one per-user result into the aggregate.
    ///
    /// Skipped users are counted separately from failed ones: a user whose
    /// preferences suppressed the send did not fail to receive it.
    pub fn absorb(&mut self, result: &UserDispatchResult) {
        self.total_users += 1;
        if result.skipped.is_some() {
            self.skipped_users += 1;
        } else if result.success {
            self.successful_users += 1;
        } else {
            self.failed_users += 1;
        }
        self.total_devices += result.devices_count;
        self.successful_sends += result.success_count;
        self.failed_sends += result.failure_count;
    }

    /// Count a user whose dispatch aborted on an infrastructure error.
    pub fn absorb_error(&mut self) {
        self.total_users += 1;
        self.failed_users += 1;
    }
}

/// Outcome of a topic broadcast.
#[derive(Debug, Serialize)]
pub struct TopicSendResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a direct token-list blast (no per-user history rows).
#[derive(Debug, Serialize)]
pub struct TokenBlastResult {
    pub success_count: usize,
    pub failure_count: usize,
    /// Permanently invalid tokens, deactivated as part of the blast.
    pub invalid_tokens: Vec<String>,
}
