//! ID/timestamp aliases and domain enums.
//!
//! Enums are stored in the database as their SCREAMING_SNAKE_CASE text
//! representation (`as_str`), matching the values accepted and produced by
//! the JSON API via serde.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Error returned when parsing a domain enum from its text discriminator.
#[derive(Debug, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Platform a device token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "ANDROID",
            Platform::Ios => "IOS",
            Platform::Web => "WEB",
        }
    }
}

impl FromStr for Platform {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANDROID" => Ok(Platform::Android),
            "IOS" => Ok(Platform::Ios),
            "WEB" => Ok(Platform::Web),
            other => Err(ParseEnumError {
                kind: "platform",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business event kind a notification was raised for.
///
/// `Custom` is the open-ended catch-all; everything else maps to a
/// per-category preference flag (see [`NotificationType::category`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    SaleCreated,
    SaleUpdated,
    SaleDeleted,
    ProductLowStock,
    ProductCreated,
    ReportGenerated,
    MlPrediction,
    System,
    Custom,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::SaleCreated => "SALE_CREATED",
            NotificationType::SaleUpdated => "SALE_UPDATED",
            NotificationType::SaleDeleted => "SALE_DELETED",
            NotificationType::ProductLowStock => "PRODUCT_LOW_STOCK",
            NotificationType::ProductCreated => "PRODUCT_CREATED",
            NotificationType::ReportGenerated => "REPORT_GENERATED",
            NotificationType::MlPrediction => "ML_PREDICTION",
            NotificationType::System => "SYSTEM",
            NotificationType::Custom => "CUSTOM",
        }
    }

    /// The preference category this type is gated by, or `None` for types
    /// without a category flag (currently only `Custom`), which are always
    /// allowed.
    pub fn category(&self) -> Option<PreferenceCategory> {
        match self {
            NotificationType::SaleCreated
            | NotificationType::SaleUpdated
            | NotificationType::SaleDeleted => Some(PreferenceCategory::Sales),
            NotificationType::ProductLowStock | NotificationType::ProductCreated => {
                Some(PreferenceCategory::Products)
            }
            NotificationType::ReportGenerated => Some(PreferenceCategory::Reports),
            NotificationType::MlPrediction => Some(PreferenceCategory::MlPredictions),
            NotificationType::System => Some(PreferenceCategory::System),
            NotificationType::Custom => None,
        }
    }
}

impl FromStr for NotificationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALE_CREATED" => Ok(NotificationType::SaleCreated),
            "SALE_UPDATED" => Ok(NotificationType::SaleUpdated),
            "SALE_DELETED" => Ok(NotificationType::SaleDeleted),
            "PRODUCT_LOW_STOCK" => Ok(NotificationType::ProductLowStock),
            "PRODUCT_CREATED" => Ok(NotificationType::ProductCreated),
            "REPORT_GENERATED" => Ok(NotificationType::ReportGenerated),
            "ML_PREDICTION" => Ok(NotificationType::MlPrediction),
            "SYSTEM" => Ok(NotificationType::System),
            "CUSTOM" => Ok(NotificationType::Custom),
            other => Err(ParseEnumError {
                kind: "notification type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category preference flag a notification type is gated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceCategory {
    Sales,
    Products,
    Reports,
    MlPredictions,
    System,
}

/// Delivery state of a notification row.
///
/// Transitions are monotonic forward: `PENDING -> SENT -> READ`, or
/// `PENDING -> FAILED` (terminal). `READ` is only reachable from `SENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
            NotificationStatus::Read => "READ",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(NotificationStatus::Pending),
            "SENT" => Ok(NotificationStatus::Sent),
            "FAILED" => Ok(NotificationStatus::Failed),
            "READ" => Ok(NotificationStatus::Read),
            other => Err(ParseEnumError {
                kind: "notification status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a campaign was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignType {
    Manual,
    Automatic,
    System,
}

impl CampaignType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignType::Manual => "MANUAL",
            CampaignType::Automatic => "AUTOMATIC",
            CampaignType::System => "SYSTEM",
        }
    }
}

impl FromStr for CampaignType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(CampaignType::Manual),
            "AUTOMATIC" => Ok(CampaignType::Automatic),
            "SYSTEM" => Ok(CampaignType::System),
            other => Err(ParseEnumError {
                kind: "campaign type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
