use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use crate::error::AppResult;
use crate::models::interaction::InteractionRecord;

#[derive(Debug, Clone)]
pub struct InteractionRow {
    pub id: String,
    pub contact_id: String,
    pub interaction_type: String,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

impl InteractionRow {
    pub fn from_record(record: &InteractionRecord) -> Self {
        Self {
            id: record.id.clone(),
            contact_id: record.contact_id.clone(),
            interaction_type: record.interaction_type.clone(),
            notes: record.notes.clone(),
            created_by: record.created_by.clone(),
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> InteractionRecord {
        InteractionRecord {
            id: self.id,
            contact_id: self.contact_id,
            interaction_type: self.interaction_type,
            notes: self.notes,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

impl TryFrom<&Row<'_>> for InteractionRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            contact_id: row.get("contact_id")?,
            interaction_type: row.get("interaction_type")?,
            notes: row.get("notes")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct InteractionRepository;

impl InteractionRepository {
    pub fn insert(conn: &Connection, row: &InteractionRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO interactions (
                    id,
                    contact_id,
                    interaction_type,
                    notes,
                    created_by,
                    created_at
                ) VALUES (
                    :id,
                    :contact_id,
                    :interaction_type,
                    :notes,
                    :created_by,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":contact_id": &row.contact_id,
                ":interaction_type": &row.interaction_type,
                ":notes": &row.notes,
                ":created_by": &row.created_by,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    /// Newest first, at most `limit` rows.
    pub fn list_recent(
        conn: &Connection,
        contact_id: &str,
        limit: usize,
    ) -> AppResult<Vec<InteractionRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    id,
                    contact_id,
                    interaction_type,
                    notes,
                    created_by,
                    created_at
                FROM interactions
                WHERE contact_id = :contact_id
                ORDER BY created_at DESC, id DESC
                LIMIT :limit
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":contact_id": contact_id,
                    ":limit": i64::try_from(limit).unwrap_or(i64::MAX),
                },
                |row| InteractionRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// `since` must be in the canonical storage format.
    pub fn count_since(conn: &Connection, contact_id: &str, since: &str) -> AppResult<usize> {
        let count: i64 = conn.query_row(
            r#"
                SELECT COUNT(*)
                FROM interactions
                WHERE contact_id = :contact_id
                  AND created_at >= :since
            "#,
            named_params! {":contact_id": contact_id, ":since": since},
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
