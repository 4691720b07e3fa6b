//! Notification preference entity model and DTOs.

use chrono::NaiveTime;
use courier_core::types::{DbId, NotificationType, PreferenceCategory, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notification_preferences` table. One per user, created
/// lazily with every flag defaulted to "notifications on".
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationPreference {
    pub id: DbId,
    pub user_id: DbId,
    pub enabled: bool,
    pub sale_notifications: bool,
    pub product_notifications: bool,
    pub report_notifications: bool,
    pub ml_notifications: bool,
    pub system_notifications: bool,
    pub quiet_hours_start: Option<NaiveTime>,
    pub quiet_hours_end: Option<NaiveTime>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationPreference {
    /// The category flag gating the given notification type. Types without a
    /// category (CUSTOM) are always allowed.
    pub fn allows_type(&self, notification_type: NotificationType) -> bool {
        match notification_type.category() {
            Some(PreferenceCategory::Sales) => self.sale_notifications,
            Some(PreferenceCategory::Products) => self.product_notifications,
            Some(PreferenceCategory::Reports) => self.report_notifications,
            Some(PreferenceCategory::MlPredictions) => self.ml_notifications,
            Some(PreferenceCategory::System) => self.system_notifications,
            None => true,
        }
    }
}

/// DTO for a partial preference update. `None` fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePreference {
    pub enabled: Option<bool>,
    pub sale_notifications: Option<bool>,
    pub product_notifications: Option<bool>,
    pub report_notifications: Option<bool>,
    pub ml_notifications: Option<bool>,
    pub system_notifications: Option<bool>,
    // Double Option: absent = unchanged, null = clear the bound.
    #[serde(default, with = "double_option")]
    pub quiet_hours_start: Option<Option<NaiveTime>>,
    #[serde(default, with = "double_option")]
    pub quiet_hours_end: Option<Option<NaiveTime>>,
}

/// Serde helper distinguishing an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
