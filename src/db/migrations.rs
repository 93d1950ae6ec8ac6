use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::utils::time::format_timestamp;

const USER_VERSION: i32 = 5;

#[derive(Debug)]
pub struct MigrationInfo {
    pub version: i32,
    pub description: String,
    pub applied_at: DateTime<Utc>,
}

pub fn run(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL,
            rollback_sql TEXT
        );
        "#,
    )?;

    let mut current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version < 1 {
        info!(target: "app::db", version = current_version, "running migration v1");
        migrate_to_v1(conn)?;
        current_version = 1;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(
            conn,
            1,
            "Add engagement scores and suggestions",
            Some(
                r#"
                DROP TABLE IF EXISTS ai_suggestions;
                DROP TABLE IF EXISTS ai_engagement_scores;
                "#,
            ),
        )?;
    }

    if current_version < 2 {
        info!(target: "app::db", version = current_version, "running migration v2");
        migrate_to_v2(conn)?;
        current_version = 2;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(conn, 2, "Record suggestion reviewer and review time", None)?;
    }

    if current_version < 3 {
        info!(target: "app::db", version = current_version, "running migration v3");
        migrate_to_v3(conn)?;
        current_version = 3;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(
            conn,
            3,
            "Add collaborator notifications",
            Some("DROP TABLE IF EXISTS notifications;"),
        )?;
    }

    if current_version < 4 {
        info!(target: "app::db", version = current_version, "running migration v4");
        migrate_to_v4(conn)?;
        current_version = 4;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(
            conn,
            4,
            "Add email log",
            Some("DROP TABLE IF EXISTS emails;"),
        )?;
    }

    if current_version < 5 {
        info!(target: "app::db", version = current_version, "running migration v5");
        migrate_to_v5(conn)?;
        current_version = 5;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(
            conn,
            5,
            "Add insurance product catalog",
            Some("DROP TABLE IF EXISTS insurance_products;"),
        )?;
    }

    if current_version != USER_VERSION {
        conn.execute(&format!("PRAGMA user_version = {}", USER_VERSION), [])?;
    }

    Ok(())
}

fn record_migration(
    conn: &Connection,
    version: i32,
    description: &str,
    rollback_sql: Option<&str>,
) -> AppResult<()> {
    let now = format_timestamp(Utc::now());
    conn.execute(
        "INSERT OR REPLACE INTO migration_history (version, description, applied_at, rollback_sql) VALUES (?, ?, ?, ?)",
        (version, description, now, rollback_sql),
    )?;
    Ok(())
}

pub fn rollback_to_version(conn: &Connection, target_version: i32) -> AppResult<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if target_version >= current_version {
        warn!(
            target: "app::db",
            target_version, current_version, "rollback target is not below current version"
        );
        return Ok(());
    }

    let mut stmt = conn.prepare(
        "SELECT version, rollback_sql FROM migration_history WHERE version > ? ORDER BY version DESC",
    )?;

    let rollback_iter = stmt.query_map([target_version], |row| {
        Ok((row.get::<_, i32>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    for rollback_result in rollback_iter {
        let (version, rollback_sql) = rollback_result?;
        if let Some(sql) = rollback_sql {
            info!(target: "app::db", version, "rolling back migration");
            conn.execute_batch(&sql)?;
        } else {
            warn!(target: "app::db", version, "no rollback script for migration");
        }
    }

    conn.execute(&format!("PRAGMA user_version = {}", target_version), [])?;
    conn.execute("DELETE FROM migration_history WHERE version > ?", [target_version])?;

    Ok(())
}

pub fn get_migration_history(conn: &Connection) -> AppResult<Vec<MigrationInfo>> {
    let mut stmt = conn.prepare(
        "SELECT version, description, applied_at FROM migration_history ORDER BY version",
    )?;

    let migration_iter = stmt.query_map([], |row| {
        let applied_at_str: String = row.get(2)?;
        let applied_at = DateTime::parse_from_rfc3339(&applied_at_str)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    2,
                    "applied_at".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?
            .with_timezone(&Utc);

        Ok(MigrationInfo {
            version: row.get(0)?,
            description: row.get(1)?,
            applied_at,
        })
    })?;

    let mut migrations = Vec::new();
    for migration in migration_iter {
        migrations.push(migration?);
    }
    Ok(migrations)
}

fn migrate_to_v1(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS ai_engagement_scores (
            contact_id TEXT PRIMARY KEY REFERENCES contacts(id) ON DELETE CASCADE,
            score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
            factors TEXT NOT NULL,
            prediction_confidence REAL NOT NULL,
            calculated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ai_suggestions (
            id TEXT PRIMARY KEY,
            contact_id TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
            suggestion_type TEXT NOT NULL CHECK (suggestion_type IN ('follow_up', 'cross_sell', 'action')),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            confidence_score REAL NOT NULL,
            priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high')),
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted', 'rejected')),
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_ai_suggestions_contact_status
            ON ai_suggestions(contact_id, status);
        "#,
    )?;

    Ok(())
}

fn migrate_to_v2(conn: &Connection) -> AppResult<()> {
    ensure_column(conn, "ai_suggestions", "reviewed_by", "TEXT")?;
    ensure_column(conn, "ai_suggestions", "reviewed_at", "TEXT")?;
    Ok(())
}

fn migrate_to_v3(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            collaborator_id TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            notification_type TEXT NOT NULL,
            contact_id TEXT REFERENCES contacts(id) ON DELETE SET NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(collaborator_id, created_at DESC);
        "#,
    )?;

    Ok(())
}

fn migrate_to_v4(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS emails (
            id TEXT PRIMARY KEY,
            contact_id TEXT REFERENCES contacts(id) ON DELETE SET NULL,
            collaborator_id TEXT NOT NULL,
            from_email TEXT NOT NULL,
            to_email TEXT NOT NULL,
            subject TEXT NOT NULL,
            body TEXT,
            email_type TEXT NOT NULL CHECK (email_type IN ('outbound', 'inbound')),
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_emails_created ON emails(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_emails_contact ON emails(contact_id);
        "#,
    )?;

    Ok(())
}

fn migrate_to_v5(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS insurance_products (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            base_price REAL NOT NULL DEFAULT 0 CHECK (base_price >= 0),
            commission_rate REAL NOT NULL DEFAULT 0.05 CHECK (commission_rate BETWEEN 0 AND 1),
            cross_sell_priority INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_insurance_products_created
            ON insurance_products(created_at DESC);
        "#,
    )?;

    Ok(())
}

fn ensure_column(conn: &Connection, table: &str, column: &str, definition: &str) -> AppResult<()> {
    if !column_exists(conn, table, column)? {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {definition};");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> AppResult<bool> {
    let pragma = format!("PRAGMA table_info({table})");
    let mut stmt = conn.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        if equals_name(row, column)? {
            return Ok(true);
        }
    }

    Ok(false)
}

fn equals_name(row: &Row<'_>, column: &str) -> Result<bool, rusqlite::Error> {
    let name: String = row.get(1)?;
    Ok(name.eq_ignore_ascii_case(column))
}
