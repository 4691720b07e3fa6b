//! Shared domain primitives for the courier push-notification service.
//!
//! - [`types`] — ID/timestamp aliases and the domain enums stored as text
//!   discriminators in the database.
//! - [`roles`] — well-known user role name constants.
//! - [`error`] — the domain-level [`CoreError`](error::CoreError) type.

pub mod error;
pub mod roles;
pub mod types;
