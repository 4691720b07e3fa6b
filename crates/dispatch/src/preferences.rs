//! Per-user dispatch suppression.
//!
//! The filter is the only dispatch-path component that reads preference rows,
//! and the sole creator of them: the first check for a user lazily inserts
//! the all-enabled default row.

use chrono::{NaiveTime, Utc};
use courier_core::types::{DbId, NotificationType};
use courier_db::repositories::PreferenceRepo;
use sqlx::PgPool;

/// Decides whether a notification may be pushed to a user right now.
pub struct PreferenceFilter;

impl PreferenceFilter {
    /// Whether the user's preferences allow pushing a notification of the
    /// given type at this moment.
    ///
    /// Suppression order: global `enabled` flag, then quiet hours, then the
    /// per-category flag. Suppressed dispatches leave no notification row.
    pub async fn should_send(
        pool: &PgPool,
        user_id: DbId,
        notification_type: NotificationType,
    ) -> Result<bool, sqlx::Error> {
        let prefs = PreferenceRepo::get_or_create(pool, user_id).await?;

        if !prefs.enabled {
            tracing::debug!(user_id, "Notifications disabled; suppressing");
            return Ok(false);
        }

        if let (Some(start), Some(end)) = (prefs.quiet_hours_start, prefs.quiet_hours_end) {
            if quiet_hours_suppress(Utc::now().time(), start, end) {
                tracing::debug!(user_id, %start, %end, "Quiet hours; suppressing");
                return Ok(false);
            }
        }

        Ok(prefs.allows_type(notification_type))
    }
}

/// Whether `now` falls inside the configured quiet window.
///
/// The window is a same-day inclusive interval: `start <= now <= end`. A
/// window with `start > end` (e.g. 22:00-06:00) matches nothing, since no
/// time-of-day satisfies both bounds.
pub fn quiet_hours_suppress(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    start <= now && now <= end
}
