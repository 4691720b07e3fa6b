//! Notification entity model and query DTOs.

use courier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    pub gateway_message_id: Option<String>,
    pub campaign_id: Option<DbId>,
    pub status: String,
    pub error_message: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Per-user notification statistics.
#[derive(Debug, Serialize)]
pub struct NotificationStats {
    pub total: i64,
    pub unread: i64,
    pub sent: i64,
    pub failed: i64,
    pub by_type: Vec<TypeCount>,
}

/// Count of notifications for one notification type.
#[derive(Debug, FromRow, Serialize)]
pub struct TypeCount {
    pub notification_type: String,
    pub count: i64,
}

/// Per-campaign notification counts by status.
#[derive(Debug, FromRow, Serialize)]
pub struct CampaignStatusCounts {
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
    pub pending: i64,
    pub read: i64,
}
