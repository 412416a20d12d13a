use std::sync::Arc;

use crewgate_core::eligibility::fields::FieldRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: crewgate_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Field catalog, loaded once at startup and read-only thereafter.
    pub registry: Arc<FieldRegistry>,
}
