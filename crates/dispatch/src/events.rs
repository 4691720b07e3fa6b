//! Domain event helpers.
//!
//! Thin wrappers other services call when something notification-worthy
//! happens. Each builds a typed request and routes it to the interested
//! population; delivery failures are already absorbed into the batch result,
//! so callers fire and forget.

use courier_core::types::{DbId, NotificationType};
use serde_json::json;

use crate::dispatcher::{DispatchRequest, NotificationDispatcher};
use crate::result::BatchDispatchResult;
use crate::DispatchError;

/// A sale was completed.
pub async fn notify_order_completed(
    dispatcher: &NotificationDispatcher,
    sale_id: DbId,
    total: f64,
    customer: &str,
) -> Result<BatchDispatchResult, DispatchError> {
    let request = DispatchRequest::new(
        NotificationType::SaleCreated,
        "New sale",
        format!("Sale #{sale_id} completed for {customer}: ${total:.2}"),
    )
    .with_data(json!({ "sale_id": sale_id, "total": total, "customer": customer }));
    dispatcher.send_to_all_admins(&request).await
}

/// A product dropped to or below its stock threshold.
pub async fn notify_product_low_stock(
    dispatcher: &NotificationDispatcher,
    product_id: DbId,
    product_name: &str,
    stock: i64,
) -> Result<BatchDispatchResult, DispatchError> {
    let request = DispatchRequest::new(
        NotificationType::ProductLowStock,
        "Low stock",
        format!("{product_name} is down to {stock} units"),
    )
    .with_data(json!({ "product_id": product_id, "stock": stock }));
    dispatcher.send_to_all_admins(&request).await
}

/// A background report finished rendering. Targets the requesting user, not
/// the admin population.
pub async fn notify_report_generated(
    dispatcher: &NotificationDispatcher,
    user_id: DbId,
    report_name: &str,
) -> Result<BatchDispatchResult, DispatchError> {
    let request = DispatchRequest::new(
        NotificationType::ReportGenerated,
        "Report ready",
        format!("Your report \"{report_name}\" is ready to download"),
    )
    .with_data(json!({ "report_name": report_name }));
    dispatcher.dispatch_to_users(&[user_id], &request, None).await
}

/// A forecasting run a user requested finished. Targets the requesting user,
/// not the admin population.
pub async fn notify_ml_prediction(
    dispatcher: &NotificationDispatcher,
    user_id: DbId,
    prediction: serde_json::Value,
) -> Result<BatchDispatchResult, DispatchError> {
    let request = DispatchRequest::new(
        NotificationType::MlPrediction,
        "Prediction complete",
        "Your sales prediction has been processed",
    )
    .with_data(prediction);
    dispatcher.dispatch_to_users(&[user_id], &request, None).await
}
