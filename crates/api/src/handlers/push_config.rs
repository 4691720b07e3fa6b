//! Handler for the public client push configuration.

use axum::http::StatusCode;
use axum::Json;
use courier_gateway::ClientConfig;

/// GET /api/v1/push/client-config
///
/// Public configuration blob for client push SDK initialization. Returns
/// 503 naming the missing fields when the deployment is incomplete, so a
/// half-configured server does not hand clients a config that fails in
/// confusing ways.
pub async fn client_config() -> (StatusCode, Json<serde_json::Value>) {
    let config = ClientConfig::from_env();

    let missing = config.missing_required();
    if !missing.is_empty() {
        tracing::warn!(?missing, "Client push config requested but incomplete");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "Push configuration is incomplete",
                "code": "PUSH_CONFIG_INCOMPLETE",
                "missing": missing,
            })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "data": config })),
    )
}
