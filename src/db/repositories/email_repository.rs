use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use super::like_pattern;
use crate::error::{AppError, AppResult};
use crate::models::email::{EmailDirection, EmailRecord};

#[derive(Debug, Clone)]
pub struct EmailRow {
    pub id: String,
    pub contact_id: Option<String>,
    pub collaborator_id: String,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    pub body: Option<String>,
    pub email_type: String,
    pub created_at: String,
}

impl EmailRow {
    pub fn from_record(record: &EmailRecord) -> Self {
        Self {
            id: record.id.clone(),
            contact_id: record.contact_id.clone(),
            collaborator_id: record.collaborator_id.clone(),
            from_email: record.from_email.clone(),
            to_email: record.to_email.clone(),
            subject: record.subject.clone(),
            body: record.body.clone(),
            email_type: record.email_type.as_str().to_string(),
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<EmailRecord> {
        let email_type =
            EmailDirection::try_from(self.email_type.as_str()).map_err(AppError::validation)?;

        Ok(EmailRecord {
            id: self.id,
            contact_id: self.contact_id,
            collaborator_id: self.collaborator_id,
            from_email: self.from_email,
            to_email: self.to_email,
            subject: self.subject,
            body: self.body,
            email_type,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<&Row<'_>> for EmailRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            contact_id: row.get("contact_id")?,
            collaborator_id: row.get("collaborator_id")?,
            from_email: row.get("from_email")?,
            to_email: row.get("to_email")?,
            subject: row.get("subject")?,
            body: row.get("body")?,
            email_type: row.get("email_type")?,
            created_at: row.get("created_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        contact_id,
        collaborator_id,
        from_email,
        to_email,
        subject,
        body,
        email_type,
        created_at
    FROM emails
"#;

const LIST_FILTER: &str = r#"
    WHERE (:email_type IS NULL OR email_type = :email_type)
      AND (
        :pattern IS NULL
        OR subject LIKE :pattern ESCAPE '\'
        OR from_email LIKE :pattern ESCAPE '\'
        OR to_email LIKE :pattern ESCAPE '\'
      )
"#;

pub struct EmailRepository;

impl EmailRepository {
    pub fn insert(conn: &Connection, row: &EmailRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO emails (
                    id,
                    contact_id,
                    collaborator_id,
                    from_email,
                    to_email,
                    subject,
                    body,
                    email_type,
                    created_at
                ) VALUES (
                    :id,
                    :contact_id,
                    :collaborator_id,
                    :from_email,
                    :to_email,
                    :subject,
                    :body,
                    :email_type,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":contact_id": &row.contact_id,
                ":collaborator_id": &row.collaborator_id,
                ":from_email": &row.from_email,
                ":to_email": &row.to_email,
                ":subject": &row.subject,
                ":body": &row.body,
                ":email_type": &row.email_type,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    /// Newest first. `search` is matched case-insensitively against subject,
    /// sender and recipient.
    pub fn search_page(
        conn: &Connection,
        direction: Option<EmailDirection>,
        search: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<EmailRow>> {
        let sql = format!(
            "{SELECT_COLUMNS} {LIST_FILTER} ORDER BY created_at DESC, id LIMIT :limit OFFSET :offset"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":email_type": direction.map(|d| d.as_str()),
                    ":pattern": search.map(like_pattern),
                    ":limit": i64::from(limit),
                    ":offset": offset as i64,
                },
                |row| EmailRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_matching(
        conn: &Connection,
        direction: Option<EmailDirection>,
        search: Option<&str>,
    ) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM emails {LIST_FILTER}");
        let count: i64 = conn.query_row(
            &sql,
            named_params! {
                ":email_type": direction.map(|d| d.as_str()),
                ":pattern": search.map(like_pattern),
            },
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
