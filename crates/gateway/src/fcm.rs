//! FCM HTTP v1 implementation of [`PushGateway`].
//!
//! Authentication uses the service account's RSA key to sign an OAuth 2.0
//! JWT assertion, exchanged at the token endpoint for a short-lived bearer
//! token that is cached until shortly before expiry. Each send is one HTTP
//! request with a bounded timeout; multicast fans out per token so every
//! target gets an individually classified outcome.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::credentials::ServiceAccount;
use crate::{
    FailureKind, MulticastOutcome, PushGateway, PushMessage, SendFailure, TokenOutcome,
    TopicChangeOutcome,
};

/// HTTP request timeout for a single gateway call. Timeouts are transient
/// failures and never deactivate tokens.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OAuth scope for FCM sends and topic management.
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Lifetime of the signed OAuth assertion in seconds.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh the cached bearer token this many seconds before it expires.
const TOKEN_EXPIRY_SLACK_SECS: i64 = 60;

/// Topic subscription management endpoints (Instance ID API).
const TOPIC_SUBSCRIBE_URL: &str = "https://iid.googleapis.com/iid/v1:batchAdd";
const TOPIC_UNSUBSCRIBE_URL: &str = "https://iid.googleapis.com/iid/v1:batchRemove";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Internal error type for gateway HTTP/auth plumbing. Converted into
/// classified [`SendFailure`]s before leaving this module.
#[derive(Debug, thiserror::Error)]
enum FcmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to sign OAuth assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token endpoint returned HTTP {0}")]
    TokenEndpoint(u16),

    #[error("FCM returned HTTP {status}: {detail}")]
    Send {
        status: u16,
        kind: FailureKind,
        detail: String,
    },
}

impl FcmError {
    fn into_send_failure(self) -> SendFailure {
        match self {
            FcmError::Send { kind, detail, .. } => SendFailure::new(kind, detail),
            other => SendFailure::new(FailureKind::Other, other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// OAuth token handling
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    bearer: String,
    expires_at: i64,
}

// ---------------------------------------------------------------------------
// FcmGateway
// ---------------------------------------------------------------------------

struct FcmClient {
    http: reqwest::Client,
    account: ServiceAccount,
    signing_key: EncodingKey,
    send_url: String,
    token: RwLock<Option<CachedToken>>,
}

/// FCM-backed push gateway.
///
/// Constructed once at process start and shared behind an `Arc`; holds no
/// global state. When built without credentials every operation reports
/// failure uniformly (see [`PushGateway`]).
pub struct FcmGateway {
    client: Option<FcmClient>,
}

impl FcmGateway {
    /// Build a gateway from loaded service-account credentials.
    ///
    /// Returns the uninitialized gateway when the private key cannot be
    /// parsed, logging the reason, so a bad key degrades the same way as a
    /// missing one.
    pub fn new(account: Option<ServiceAccount>) -> Self {
        let Some(account) = account else {
            tracing::warn!(
                "No push credentials configured; push notifications are disabled \
                 and every send will report failure"
            );
            return Self { client: None };
        };

        let signing_key = match EncodingKey::from_rsa_pem(account.private_key.as_bytes()) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(error = %e, "Invalid service-account private key; push disabled");
                return Self { client: None };
            }
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");

        let send_url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            account.project_id
        );

        tracing::info!(project_id = %account.project_id, "FCM gateway initialized");

        Self {
            client: Some(FcmClient {
                http,
                account,
                signing_key,
                send_url,
                token: RwLock::new(None),
            }),
        }
    }

    /// Build an explicitly disabled gateway (no credentials).
    pub fn disabled() -> Self {
        Self { client: None }
    }
}

impl FcmClient {
    /// Get a bearer token, refreshing the cache when it is absent or close
    /// to expiry.
    async fn bearer_token(&self) -> Result<String, FcmError> {
        let now = Utc::now().timestamp();

        if let Some(cached) = self.token.read().await.as_ref() {
            if cached.expires_at - TOKEN_EXPIRY_SLACK_SECS > now {
                return Ok(cached.bearer.clone());
            }
        }

        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: OAUTH_SCOPE,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)?;

        let response = self
            .http
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FcmError::TokenEndpoint(response.status().as_u16()));
        }

        let token: TokenResponse = response.json().await?;
        let cached = CachedToken {
            bearer: token.access_token.clone(),
            expires_at: now + token.expires_in,
        };
        *self.token.write().await = Some(cached);

        Ok(token.access_token)
    }

    /// Execute one `messages:send` call and return the gateway message id.
    async fn send_message(&self, target: Target<'_>, message: &PushMessage) -> Result<String, FcmError> {
        let bearer = self.bearer_token().await?;
        let payload = build_message_payload(target, message);

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(bearer)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let kind = classify_send_error(status.as_u16(), &body);
            let detail = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("FCM send failed")
                .to_string();
            return Err(FcmError::Send {
                status: status.as_u16(),
                kind,
                detail,
            });
        }

        #[derive(Deserialize)]
        struct SendResponse {
            name: String,
        }
        let sent: SendResponse = response.json().await?;
        Ok(sent.name)
    }

    /// Execute one Instance ID batch subscription change.
    async fn change_topic(
        &self,
        url: &str,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicChangeOutcome, FcmError> {
        let bearer = self.bearer_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .header("access_token_auth", "true")
            .json(&serde_json::json!({
                "to": format!("/topics/{topic}"),
                "registration_tokens": tokens,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FcmError::Send {
                status: response.status().as_u16(),
                kind: FailureKind::Other,
                detail: format!("topic change returned HTTP {}", response.status()),
            });
        }

        // The IID API returns one result object per token; an empty object
        // means success, an object with an "error" field means failure.
        #[derive(Deserialize)]
        struct BatchResponse {
            #[serde(default)]
            results: Vec<serde_json::Value>,
        }
        let batch: BatchResponse = response.json().await?;

        let failure_count = batch
            .results
            .iter()
            .filter(|r| r.get("error").is_some())
            .count();
        Ok(TopicChangeOutcome {
            success_count: tokens.len().saturating_sub(failure_count),
            failure_count,
        })
    }
}

/// Send target: one token or one topic.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Token(&'a str),
    Topic(&'a str),
}

/// Build the FCM v1 message JSON, including the platform overrides the
/// mobile/web clients expect (high-priority Android channel, APNS badge,
/// web-push icons).
fn build_message_payload(target: Target<'_>, message: &PushMessage) -> serde_json::Value {
    let mut notification = serde_json::json!({
        "title": message.title,
        "body": message.body,
    });
    if let Some(image) = &message.image_url {
        notification["image"] = serde_json::Value::String(image.clone());
    }

    let mut msg = serde_json::json!({
        "notification": notification,
        "data": message.data,
        "android": {
            "priority": "HIGH",
            "notification": {
                "icon": "ic_notification",
                "color": "#007AFF",
                "sound": "default",
            },
        },
        "apns": {
            "payload": { "aps": { "badge": 1, "sound": "default" } },
        },
        "webpush": {
            "notification": {
                "icon": "/static/icon.png",
                "badge": "/static/badge.png",
            },
        },
    });

    match target {
        Target::Token(token) => msg["token"] = serde_json::Value::String(token.to_string()),
        Target::Topic(topic) => msg["topic"] = serde_json::Value::String(topic.to_string()),
    }

    serde_json::json!({ "message": msg })
}

/// Classify an FCM send error into a [`FailureKind`].
///
/// FCM reports token invalidity as `UNREGISTERED` (HTTP 404) and sender
/// mismatch as `SENDER_ID_MISMATCH` (HTTP 403); both are permanent. The
/// error code lives in `error.details[].errorCode`, with `error.status` as
/// fallback.
fn classify_send_error(status: u16, body: &serde_json::Value) -> FailureKind {
    let error_code = body
        .pointer("/error/details")
        .and_then(|d| d.as_array())
        .and_then(|details| {
            details
                .iter()
                .find_map(|d| d.get("errorCode").and_then(|c| c.as_str()))
        })
        .or_else(|| body.pointer("/error/status").and_then(|s| s.as_str()));

    match (error_code, status) {
        (Some("UNREGISTERED"), _) | (None, 404) => FailureKind::Unregistered,
        (Some("SENDER_ID_MISMATCH"), _) => FailureKind::SenderMismatch,
        _ => FailureKind::Other,
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    async fn send_single(
        &self,
        token: &str,
        message: &PushMessage,
    ) -> Result<String, SendFailure> {
        let Some(client) = &self.client else {
            tracing::warn!("Push gateway not initialized; dropping single send");
            return Err(SendFailure::unavailable());
        };

        client
            .send_message(Target::Token(token), message)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Single send failed");
                e.into_send_failure()
            })
    }

    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> MulticastOutcome {
        if tokens.is_empty() {
            tracing::warn!("Multicast send requested with no tokens");
            return MulticastOutcome::default();
        }

        let Some(client) = &self.client else {
            tracing::warn!(
                tokens = tokens.len(),
                "Push gateway not initialized; reporting all-failure multicast"
            );
            return MulticastOutcome::all_failed(tokens, SendFailure::unavailable());
        };

        let mut outcome = MulticastOutcome::default();
        for token in tokens {
            let result = client
                .send_message(Target::Token(token), message)
                .await
                .map_err(|e| e.into_send_failure());

            if let Err(failure) = &result {
                tracing::warn!(
                    kind = ?failure.kind,
                    error = %failure.message,
                    "Multicast send to one token failed"
                );
            }
            outcome.push(TokenOutcome {
                token: token.clone(),
                result,
            });
        }

        tracing::info!(
            success = outcome.success_count,
            failed = outcome.failure_count,
            "Multicast send completed"
        );
        outcome
    }

    async fn send_to_topic(
        &self,
        topic: &str,
        message: &PushMessage,
    ) -> Result<String, SendFailure> {
        let Some(client) = &self.client else {
            tracing::warn!(topic, "Push gateway not initialized; dropping topic send");
            return Err(SendFailure::unavailable());
        };

        let message_id = client
            .send_message(Target::Topic(topic), message)
            .await
            .map_err(|e| {
                tracing::warn!(topic, error = %e, "Topic send failed");
                e.into_send_failure()
            })?;

        tracing::info!(topic, message_id = %message_id, "Topic send succeeded");
        Ok(message_id)
    }

    async fn subscribe(&self, tokens: &[String], topic: &str) -> TopicChangeOutcome {
        let Some(client) = &self.client else {
            return TopicChangeOutcome {
                success_count: 0,
                failure_count: tokens.len(),
            };
        };

        match client.change_topic(TOPIC_SUBSCRIBE_URL, tokens, topic).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(topic, error = %e, "Topic subscribe failed");
                TopicChangeOutcome {
                    success_count: 0,
                    failure_count: tokens.len(),
                }
            }
        }
    }

    async fn unsubscribe(&self, tokens: &[String], topic: &str) -> TopicChangeOutcome {
        let Some(client) = &self.client else {
            return TopicChangeOutcome {
                success_count: 0,
                failure_count: tokens.len(),
            };
        };

        match client
            .change_topic(TOPIC_UNSUBSCRIBE_URL, tokens, topic)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(topic, error = %e, "Topic unsubscribe failed");
                TopicChangeOutcome {
                    success_count: 0,
                    failure_count: tokens.len(),
                }
            }
        }
    }
}
