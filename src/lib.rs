pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use tracing::info;

use crate::commands::AppState;
use crate::config::CrmConfig;
use crate::db::DbPool;
use crate::error::AppResult;

/// Installs logging, opens (and migrates) the database and wires the
/// services together. Transports call this once and share the state.
pub fn bootstrap(config: &CrmConfig) -> AppResult<AppState> {
    config.validate()?;
    crate::utils::logger::init_logging(config)?;

    let pool = DbPool::new(config.database_path.clone())?;
    info!(target: "app::bootstrap", db_path = %pool.path().display(), "crm backend ready");

    Ok(AppState::new(
        pool,
        config,
        crate::utils::clock::system_clock(),
    ))
}
