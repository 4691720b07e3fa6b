//! Device token registration and lifecycle.

use std::collections::BTreeMap;

use courier_core::types::{DbId, Platform};
use courier_db::models::device_token::{DeviceToken, RegisterDeviceToken};
use courier_db::repositories::DeviceTokenRepo;
use courier_gateway::{PushGateway, PushMessage};
use sqlx::PgPool;

use crate::DispatchError;

/// Registration-side service over the token table.
pub struct DeviceTokenRegistry;

impl DeviceTokenRegistry {
    /// Register (or re-register) a device token for a user.
    ///
    /// When `validate` is set, a silent data-only message is sent to the
    /// token first; zero successes reject the registration with the gateway's
    /// classified reason and persist nothing. An uninitialized gateway fails
    /// every send, so validated registration is rejected there too.
    pub async fn register(
        pool: &PgPool,
        gateway: &dyn PushGateway,
        user_id: DbId,
        request: &RegisterDeviceToken,
        validate: bool,
    ) -> Result<DeviceToken, DispatchError> {
        if validate {
            let probe = PushMessage::default().with_data(BTreeMap::from([(
                "type".to_string(),
                "token_validation".to_string(),
            )]));
            let outcome = gateway
                .send_multicast(std::slice::from_ref(&request.token), &probe)
                .await;

            if outcome.success_count == 0 {
                let reason = outcome
                    .first_error()
                    .unwrap_or("token rejected by gateway")
                    .to_string();
                tracing::info!(
                    user_id,
                    token = %request.token,
                    reason,
                    "Rejected device token at registration"
                );
                return Err(DispatchError::InvalidToken(reason));
            }
        }

        let platform = request.platform.unwrap_or(Platform::Web);
        let token = DeviceTokenRepo::upsert(
            pool,
            user_id,
            &request.token,
            platform.as_str(),
            request.device_name.as_deref(),
        )
        .await?;

        tracing::info!(user_id, platform = %platform, "Device token registered");
        Ok(token)
    }

    /// Deactivate a token. Returns `false` when the token is unknown.
    pub async fn unregister(pool: &PgPool, token: &str) -> Result<bool, DispatchError> {
        let existed = DeviceTokenRepo::deactivate(pool, token).await?;
        if existed {
            tracing::info!("Device token unregistered");
        }
        Ok(existed)
    }

    /// List a user's tokens, optionally restricted to active ones.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        active_only: bool,
    ) -> Result<Vec<DeviceToken>, DispatchError> {
        Ok(DeviceTokenRepo::list_for_user(pool, user_id, active_only).await?)
    }
}
