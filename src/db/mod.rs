use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::AppResult;

pub mod migrations;

pub mod repositories;

const SCHEMA_SQL: &str = include_str!("schema.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection factory for the CRM database.
///
/// The schema and migrations are applied once, when the pool is created.
/// Connections handed out afterwards are only configured.
#[derive(Clone, Debug)]
pub struct DbPool {
    path: PathBuf,
}

impl DbPool {
    pub fn new<P: Into<PathBuf>>(path: P) -> AppResult<Self> {
        let path = path.into();
        info!(target: "app::db", db_path = %path.display(), "initializing database pool");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let pool = Self { path };
        pool.initialize()?;
        Ok(pool)
    }

    fn initialize(&self) -> AppResult<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL)?;
        migrations::run(&conn)?;
        info!(target: "app::db", db_path = %self.path.display(), "database schema up to date");
        Ok(())
    }

    pub fn get_connection(&self) -> AppResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", 1)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        debug!(target: "app::db", db_path = %self.path.display(), "database connection opened");
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.get_connection()?;
        callback(&conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
