//! Well-known user role name constants.
//!
//! These must match the role values stored in the `users.role` column and
//! checked by the API's RBAC extractors.

/// Administrator: may send notifications, manage campaigns, and inspect
/// reachable users.
pub const ROLE_ADMIN: &str = "admin";

/// Regular user: may manage their own device tokens, preferences, and
/// notification history.
pub const ROLE_USER: &str = "user";
