use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::engagement::{EngagementFactors, EngagementScoreRecord};

#[derive(Debug, Clone)]
pub struct EngagementScoreRow {
    pub contact_id: String,
    pub score: i64,
    pub factors: String,
    pub prediction_confidence: f64,
    pub calculated_at: String,
}

impl EngagementScoreRow {
    pub fn from_record(record: &EngagementScoreRecord) -> AppResult<Self> {
        Ok(Self {
            contact_id: record.contact_id.clone(),
            score: record.score,
            factors: serde_json::to_string(&record.factors).map_err(AppError::from)?,
            prediction_confidence: record.confidence,
            calculated_at: record.calculated_at.clone(),
        })
    }

    pub fn into_record(self) -> AppResult<EngagementScoreRecord> {
        let factors: EngagementFactors =
            serde_json::from_str(&self.factors).map_err(AppError::from)?;

        Ok(EngagementScoreRecord {
            contact_id: self.contact_id,
            score: self.score,
            factors,
            confidence: self.prediction_confidence,
            calculated_at: self.calculated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for EngagementScoreRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            contact_id: row.get("contact_id")?,
            score: row.get("score")?,
            factors: row.get("factors")?,
            prediction_confidence: row.get("prediction_confidence")?,
            calculated_at: row.get("calculated_at")?,
        })
    }
}

pub struct EngagementRepository;

impl EngagementRepository {
    /// One row per contact; a later call replaces every column.
    pub fn upsert_score(conn: &Connection, row: &EngagementScoreRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO ai_engagement_scores (
                    contact_id,
                    score,
                    factors,
                    prediction_confidence,
                    calculated_at
                ) VALUES (
                    :contact_id,
                    :score,
                    :factors,
                    :prediction_confidence,
                    :calculated_at
                )
                ON CONFLICT(contact_id) DO UPDATE SET
                    score = excluded.score,
                    factors = excluded.factors,
                    prediction_confidence = excluded.prediction_confidence,
                    calculated_at = excluded.calculated_at
            "#,
            named_params! {
                ":contact_id": &row.contact_id,
                ":score": &row.score,
                ":factors": &row.factors,
                ":prediction_confidence": &row.prediction_confidence,
                ":calculated_at": &row.calculated_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_contact(
        conn: &Connection,
        contact_id: &str,
    ) -> AppResult<Option<EngagementScoreRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    contact_id,
                    score,
                    factors,
                    prediction_confidence,
                    calculated_at
                FROM ai_engagement_scores
                WHERE contact_id = :contact_id
            "#,
        )?;

        let row = stmt
            .query_row(named_params! {":contact_id": contact_id}, |row| {
                EngagementScoreRow::try_from(row)
            })
            .optional()?;

        Ok(row)
    }
}
