//! Dispatch orchestration: preference filtering, per-user and batch sends,
//! token registration, and campaign bookkeeping.
//!
//! The dispatcher converts gateway and persistence failures into structured
//! results rather than bubbling them, so a dead token or an uninitialized
//! gateway shows up as counts in a [`BatchDispatchResult`], never as a crash
//! in the business flow that triggered the notification.

pub mod campaign;
pub mod dispatcher;
pub mod events;
pub mod preferences;
pub mod registry;
pub mod result;

pub use campaign::CampaignTracker;
pub use dispatcher::{CampaignSeed, DispatchRequest, NotificationDispatcher};
pub use preferences::PreferenceFilter;
pub use registry::DeviceTokenRegistry;
pub use result::{
    BatchDispatchResult, SkipReason, TokenBlastResult, TopicSendResult, UserDispatchResult,
};

/// Error from a dispatch-layer operation.
///
/// Per-token send failures are data (see [`result`]); this type covers the
/// failures that genuinely abort an operation.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The gateway rejected a token during registration validation.
    #[error("Device token rejected by push gateway: {0}")]
    InvalidToken(String),

    #[error("Campaign {0} not found")]
    CampaignNotFound(courier_core::types::DbId),
}
