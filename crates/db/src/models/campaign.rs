//! Notification campaign entity model and DTOs.

use courier_core::types::{CampaignType, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notification_campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationCampaign {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub campaign_type: String,
    pub created_by: Option<DbId>,
    pub total_users: i64,
    pub successful_sends: i64,
    pub failed_sends: i64,
    pub is_completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationCampaign {
    /// Delivery success rate as a percentage rounded to two decimals.
    ///
    /// Zero when the campaign targeted no users.
    pub fn success_rate(&self) -> f64 {
        if self.total_users == 0 {
            return 0.0;
        }
        let rate = self.successful_sends as f64 / self.total_users as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

/// DTO for creating a campaign.
#[derive(Debug, Deserialize)]
pub struct CreateCampaign {
    pub title: String,
    pub description: Option<String>,
    pub campaign_type: Option<CampaignType>,
}
