//! Device token entity model and DTOs.

use courier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `device_tokens` table.
///
/// The token string is the identity key: one token string maps to exactly
/// one active owner at a time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token: String,
    pub platform: String,
    pub device_name: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_used: Timestamp,
}

/// DTO for registering a device token.
#[derive(Debug, Deserialize)]
pub struct RegisterDeviceToken {
    pub token: String,
    pub platform: Option<courier_core::types::Platform>,
    pub device_name: Option<String>,
}
