use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use crate::error::AppResult;
use crate::models::notification::{NotificationFilter, NotificationRecord};

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub collaborator_id: String,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub contact_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl NotificationRow {
    pub fn from_record(record: &NotificationRecord) -> Self {
        Self {
            id: record.id.clone(),
            collaborator_id: record.collaborator_id.clone(),
            title: record.title.clone(),
            message: record.message.clone(),
            notification_type: record.notification_type.clone(),
            contact_id: record.contact_id.clone(),
            is_read: record.is_read,
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> NotificationRecord {
        NotificationRecord {
            id: self.id,
            collaborator_id: self.collaborator_id,
            title: self.title,
            message: self.message,
            notification_type: self.notification_type,
            contact_id: self.contact_id,
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

impl TryFrom<&Row<'_>> for NotificationRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            collaborator_id: row.get("collaborator_id")?,
            title: row.get("title")?,
            message: row.get("message")?,
            notification_type: row.get("notification_type")?,
            contact_id: row.get("contact_id")?,
            is_read: row.get("is_read")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct NotificationRepository;

impl NotificationRepository {
    pub fn insert(conn: &Connection, row: &NotificationRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO notifications (
                    id,
                    collaborator_id,
                    title,
                    message,
                    notification_type,
                    contact_id,
                    is_read,
                    created_at
                ) VALUES (
                    :id,
                    :collaborator_id,
                    :title,
                    :message,
                    :notification_type,
                    :contact_id,
                    :is_read,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":collaborator_id": &row.collaborator_id,
                ":title": &row.title,
                ":message": &row.message,
                ":notification_type": &row.notification_type,
                ":contact_id": &row.contact_id,
                ":is_read": &row.is_read,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    /// Newest first.
    pub fn list_for_collaborator(
        conn: &Connection,
        collaborator_id: &str,
        filter: NotificationFilter,
    ) -> AppResult<Vec<NotificationRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    id,
                    collaborator_id,
                    title,
                    message,
                    notification_type,
                    contact_id,
                    is_read,
                    created_at
                FROM notifications
                WHERE collaborator_id = :collaborator_id
                  AND (:is_read IS NULL OR is_read = :is_read)
                ORDER BY created_at DESC, id
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":collaborator_id": collaborator_id,
                    ":is_read": filter.read_flag(),
                },
                |row| NotificationRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn mark_read(conn: &Connection, id: &str) -> AppResult<usize> {
        let updated = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = :id",
            named_params! {":id": id},
        )?;
        Ok(updated)
    }
}
