use std::sync::Arc;

use courier_dispatch::NotificationDispatcher;
use courier_gateway::PushGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: courier_db::DbPool,
    /// Server configuration (JWT secret, CORS, timeouts).
    pub config: Arc<ServerConfig>,
    /// Push gateway, shared with the dispatcher.
    pub gateway: Arc<dyn PushGateway>,
    /// Dispatch orchestrator over the pool and gateway.
    pub dispatcher: NotificationDispatcher,
}

impl AppState {
    pub fn new(
        pool: courier_db::DbPool,
        config: ServerConfig,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        let dispatcher = NotificationDispatcher::new(pool.clone(), Arc::clone(&gateway));
        Self {
            pool,
            config: Arc::new(config),
            gateway,
            dispatcher,
        }
    }
}
