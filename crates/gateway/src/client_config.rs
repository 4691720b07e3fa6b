//! Client-side push configuration.
//!
//! Web and mobile clients initialize their push SDK from a public config
//! blob served by the API. The values are not secrets, but serving a partial
//! config produces confusing client-side failures, so the handler refuses to
//! serve one with required fields missing.

use serde::Serialize;

/// Public SDK configuration, serialized in the camelCase shape the client
/// SDK consumes directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vapid_key: Option<String>,
}

impl ClientConfig {
    /// Load the client config from the environment.
    ///
    /// | Env Var                        | Field               | Required |
    /// |--------------------------------|---------------------|----------|
    /// | `FIREBASE_PUBLIC_API_KEY`      | `apiKey`            | yes      |
    /// | `FIREBASE_AUTH_DOMAIN`         | `authDomain`        | yes      |
    /// | `FIREBASE_PROJECT_ID`          | `projectId`         | yes      |
    /// | `FIREBASE_STORAGE_BUCKET`      | `storageBucket`     | no       |
    /// | `FIREBASE_MESSAGING_SENDER_ID` | `messagingSenderId` | yes      |
    /// | `FIREBASE_APP_ID`              | `appId`             | yes      |
    /// | `FIREBASE_VAPID_KEY`           | `vapidKey`          | no       |
    ///
    /// Unset variables load as empty strings; completeness is checked
    /// separately via [`missing_required`](Self::missing_required) so the
    /// handler can name exactly what is absent.
    pub fn from_env() -> Self {
        Self {
            api_key: env_or_empty("FIREBASE_PUBLIC_API_KEY"),
            auth_domain: env_or_empty("FIREBASE_AUTH_DOMAIN"),
            project_id: env_or_empty("FIREBASE_PROJECT_ID"),
            storage_bucket: env_or_empty("FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: env_or_empty("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: env_or_empty("FIREBASE_APP_ID"),
            vapid_key: std::env::var("FIREBASE_VAPID_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    /// Names of required fields that are empty, in client-facing camelCase.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_empty() {
            missing.push("apiKey");
        }
        if self.auth_domain.is_empty() {
            missing.push("authDomain");
        }
        if self.project_id.is_empty() {
            missing.push("projectId");
        }
        if self.messaging_sender_id.is_empty() {
            missing.push("messagingSenderId");
        }
        if self.app_id.is_empty() {
            missing.push("appId");
        }
        missing
    }

    /// Whether every required field is present.
    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
