use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::contact::{ContactRecord, ContactStatus};

#[derive(Debug, Clone)]
pub struct ContactRow {
    pub id: String,
    pub client_code: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub assigned_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ContactRow {
    pub fn from_record(record: &ContactRecord) -> Self {
        Self {
            id: record.id.clone(),
            client_code: record.client_code.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            status: record.status.as_str().to_string(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            assigned_to: record.assigned_to.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<ContactRecord> {
        let status = ContactStatus::try_from(self.status.as_str()).map_err(AppError::validation)?;

        Ok(ContactRecord {
            id: self.id,
            client_code: self.client_code,
            first_name: self.first_name,
            last_name: self.last_name,
            status,
            email: self.email,
            phone: self.phone,
            assigned_to: self.assigned_to,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for ContactRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            client_code: row.get("client_code")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            status: row.get("status")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            assigned_to: row.get("assigned_to")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        client_code,
        first_name,
        last_name,
        status,
        email,
        phone,
        assigned_to,
        created_at,
        updated_at
    FROM contacts
"#;

pub struct ContactRepository;

impl ContactRepository {
    pub fn insert(conn: &Connection, row: &ContactRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO contacts (
                    id,
                    client_code,
                    first_name,
                    last_name,
                    status,
                    email,
                    phone,
                    assigned_to,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :client_code,
                    :first_name,
                    :last_name,
                    :status,
                    :email,
                    :phone,
                    :assigned_to,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":client_code": &row.client_code,
                ":first_name": &row.first_name,
                ":last_name": &row.last_name,
                ":status": &row.status,
                ":email": &row.email,
                ":phone": &row.phone,
                ":assigned_to": &row.assigned_to,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ContactRow>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! {":id": id}, |row| ContactRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list(conn: &Connection, status: Option<ContactStatus>) -> AppResult<Vec<ContactRow>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE (:status IS NULL OR status = :status) ORDER BY created_at DESC, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {":status": status.map(|s| s.as_str())},
                |row| ContactRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(conn: &Connection, status: Option<ContactStatus>) -> AppResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM contacts WHERE (:status IS NULL OR status = :status)",
            named_params! {":status": status.map(|s| s.as_str())},
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Distinct collaborator ids seen as contact or contract assignee,
    /// interaction author or email sender.
    pub fn count_collaborators(conn: &Connection) -> AppResult<i64> {
        let count = conn.query_row(
            r#"
                SELECT COUNT(*) FROM (
                    SELECT assigned_to AS collaborator_id FROM contacts WHERE assigned_to IS NOT NULL
                    UNION
                    SELECT assigned_to FROM contracts WHERE assigned_to IS NOT NULL
                    UNION
                    SELECT created_by FROM interactions
                    UNION
                    SELECT collaborator_id FROM emails
                )
            "#,
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn client_code_exists(conn: &Connection, client_code: &str) -> AppResult<bool> {
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contacts WHERE client_code = :client_code)",
            named_params! {":client_code": client_code},
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
