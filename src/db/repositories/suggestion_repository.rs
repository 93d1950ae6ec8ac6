use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::suggestion::{
    SuggestionPriority, SuggestionRecord, SuggestionStatus, SuggestionType,
};

#[derive(Debug, Clone)]
pub struct SuggestionRow {
    pub id: String,
    pub contact_id: String,
    pub suggestion_type: String,
    pub title: String,
    pub description: String,
    pub confidence_score: f64,
    pub priority: String,
    pub status: String,
    pub created_at: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
}

impl SuggestionRow {
    pub fn from_record(record: &SuggestionRecord) -> Self {
        Self {
            id: record.id.clone(),
            contact_id: record.contact_id.clone(),
            suggestion_type: record.suggestion_type.as_str().to_string(),
            title: record.title.clone(),
            description: record.description.clone(),
            confidence_score: record.confidence_score,
            priority: record.priority.as_str().to_string(),
            status: record.status.as_str().to_string(),
            created_at: record.created_at.clone(),
            reviewed_by: record.reviewed_by.clone(),
            reviewed_at: record.reviewed_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<SuggestionRecord> {
        let suggestion_type = SuggestionType::try_from(self.suggestion_type.as_str())
            .map_err(AppError::validation)?;
        let priority =
            SuggestionPriority::try_from(self.priority.as_str()).map_err(AppError::validation)?;
        let status =
            SuggestionStatus::try_from(self.status.as_str()).map_err(AppError::validation)?;

        Ok(SuggestionRecord {
            id: self.id,
            contact_id: self.contact_id,
            suggestion_type,
            title: self.title,
            description: self.description,
            confidence_score: self.confidence_score,
            priority,
            status,
            created_at: self.created_at,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
        })
    }
}

impl TryFrom<&Row<'_>> for SuggestionRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            contact_id: row.get("contact_id")?,
            suggestion_type: row.get("suggestion_type")?,
            title: row.get("title")?,
            description: row.get("description")?,
            confidence_score: row.get("confidence_score")?,
            priority: row.get("priority")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            reviewed_by: row.get("reviewed_by")?,
            reviewed_at: row.get("reviewed_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        contact_id,
        suggestion_type,
        title,
        description,
        confidence_score,
        priority,
        status,
        created_at,
        reviewed_by,
        reviewed_at
    FROM ai_suggestions
"#;

pub struct SuggestionRepository;

impl SuggestionRepository {
    /// Callers wanting all-or-nothing semantics pass a transaction's connection.
    pub fn insert_batch(conn: &Connection, rows: &[SuggestionRow]) -> AppResult<()> {
        let mut stmt = conn.prepare(
            r#"
                INSERT INTO ai_suggestions (
                    id,
                    contact_id,
                    suggestion_type,
                    title,
                    description,
                    confidence_score,
                    priority,
                    status,
                    created_at
                ) VALUES (
                    :id,
                    :contact_id,
                    :suggestion_type,
                    :title,
                    :description,
                    :confidence_score,
                    :priority,
                    :status,
                    :created_at
                )
            "#,
        )?;

        for row in rows {
            stmt.execute(named_params! {
                ":id": &row.id,
                ":contact_id": &row.contact_id,
                ":suggestion_type": &row.suggestion_type,
                ":title": &row.title,
                ":description": &row.description,
                ":confidence_score": &row.confidence_score,
                ":priority": &row.priority,
                ":status": &row.status,
                ":created_at": &row.created_at,
            })?;
        }

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<SuggestionRow>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! {":id": id}, |row| SuggestionRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Highest confidence first.
    pub fn list_for_contact(
        conn: &Connection,
        contact_id: &str,
        status: Option<SuggestionStatus>,
    ) -> AppResult<Vec<SuggestionRow>> {
        let sql = format!(
            r#"{SELECT_COLUMNS}
                WHERE contact_id = :contact_id
                  AND (:status IS NULL OR status = :status)
                ORDER BY confidence_score DESC, created_at DESC, id"#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":contact_id": contact_id,
                    ":status": status.map(|s| s.as_str()),
                },
                |row| SuggestionRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Only pending suggestions are updated. Returns the number of rows
    /// touched; zero means the id is unknown or already reviewed.
    pub fn update_status(
        conn: &Connection,
        id: &str,
        status: SuggestionStatus,
        reviewed_by: &str,
        reviewed_at: &str,
    ) -> AppResult<usize> {
        let updated = conn.execute(
            r#"
                UPDATE ai_suggestions
                SET status = :status,
                    reviewed_by = :reviewed_by,
                    reviewed_at = :reviewed_at
                WHERE id = :id
                  AND status = 'pending'
            "#,
            named_params! {
                ":id": id,
                ":status": status.as_str(),
                ":reviewed_by": reviewed_by,
                ":reviewed_at": reviewed_at,
            },
        )?;
        Ok(updated)
    }
}
