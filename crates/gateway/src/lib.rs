//! Push gateway abstraction and the FCM HTTP v1 implementation.
//!
//! The dispatcher talks to [`PushGateway`], a narrow trait over the vendor
//! push service: single-target send, multicast send with per-token classified
//! outcomes, topic send, and topic subscription management.
//!
//! [`FcmGateway`] is the production implementation. It degrades gracefully:
//! when credentials are absent every send operation returns an all-failure
//! outcome instead of erroring, so business flows that merely attempt to
//! notify never crash on a misconfigured deployment.

pub mod client_config;
pub mod credentials;
pub mod fcm;
pub mod payload;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

pub use client_config::ClientConfig;
pub use credentials::ServiceAccount;
pub use fcm::FcmGateway;
pub use payload::coerce_data;

/// A logical push message, independent of the target.
///
/// `data` is an ordered map of string keys to string values; callers coerce
/// arbitrary payloads through [`coerce_data`] before constructing one, since
/// the gateway wire format requires homogeneous string maps.
#[derive(Debug, Clone, Default)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    pub image_url: Option<String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
            image_url: None,
        }
    }

    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data = data;
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }
}

/// Classified reason for a per-token send failure.
///
/// `Unregistered` and `SenderMismatch` are permanent: the token will never
/// work again and should be deactivated. Everything else is transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unregistered,
    SenderMismatch,
    Other,
}

impl FailureKind {
    /// Whether the failure means the token is permanently invalid.
    pub fn is_permanent(&self) -> bool {
        matches!(self, FailureKind::Unregistered | FailureKind::SenderMismatch)
    }
}

/// A single failed send with its classification.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SendFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SendFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The uniform failure every operation reports when the gateway has no
    /// credentials.
    pub fn unavailable() -> Self {
        Self::new(FailureKind::Other, "push gateway not initialized")
    }
}

/// Outcome of one token within a multicast send.
#[derive(Debug)]
pub struct TokenOutcome {
    pub token: String,
    /// Gateway message id on success, classified failure otherwise.
    pub result: Result<String, SendFailure>,
}

/// Aggregated outcome of a multicast send.
#[derive(Debug, Default)]
pub struct MulticastOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    pub per_token: Vec<TokenOutcome>,
}

impl MulticastOutcome {
    /// An all-failure outcome with the same message for every token, used
    /// when the gateway is uninitialized or the batch fails wholesale.
    pub fn all_failed(tokens: &[String], failure: SendFailure) -> Self {
        Self {
            success_count: 0,
            failure_count: tokens.len(),
            per_token: tokens
                .iter()
                .map(|t| TokenOutcome {
                    token: t.clone(),
                    result: Err(failure.clone()),
                })
                .collect(),
        }
    }

    pub fn push(&mut self, outcome: TokenOutcome) {
        match outcome.result {
            Ok(_) => self.success_count += 1,
            Err(_) => self.failure_count += 1,
        }
        self.per_token.push(outcome);
    }

    /// Tokens whose failure was classified as permanent; the dispatcher
    /// deactivates these regardless of overall success.
    pub fn invalid_tokens(&self) -> Vec<String> {
        self.per_token
            .iter()
            .filter(|o| matches!(&o.result, Err(f) if f.kind.is_permanent()))
            .map(|o| o.token.clone())
            .collect()
    }

    /// The gateway message id of the first successful send, if any.
    pub fn first_message_id(&self) -> Option<&str> {
        self.per_token
            .iter()
            .find_map(|o| o.result.as_deref().ok())
    }

    /// The failure message of the first failed send, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.per_token
            .iter()
            .find_map(|o| o.result.as_ref().err().map(|f| f.message.as_str()))
    }
}

/// Outcome of a topic subscribe/unsubscribe batch.
#[derive(Debug, Default, Serialize)]
pub struct TopicChangeOutcome {
    pub success_count: usize,
    pub failure_count: usize,
}

/// Narrow interface over the vendor push service.
///
/// Send operations never return transport-level `Err`s: failures are data
/// (classified per-token outcomes), so the dispatcher's failure handling is
/// exercised uniformly whether credentials are missing or a token is dead.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Whether credentials were loaded. When `false` every send operation
    /// returns an all-failure outcome.
    fn is_initialized(&self) -> bool;

    /// Send to a single device token, returning the gateway message id.
    async fn send_single(&self, token: &str, message: &PushMessage)
        -> Result<String, SendFailure>;

    /// Fan a message out to many device tokens, returning per-token outcomes.
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> MulticastOutcome;

    /// Broadcast to a topic, returning the gateway message id.
    async fn send_to_topic(&self, topic: &str, message: &PushMessage)
        -> Result<String, SendFailure>;

    /// Subscribe tokens to a topic.
    async fn subscribe(&self, tokens: &[String], topic: &str) -> TopicChangeOutcome;

    /// Unsubscribe tokens from a topic.
    async fn unsubscribe(&self, tokens: &[String], topic: &str) -> TopicChangeOutcome;
}
