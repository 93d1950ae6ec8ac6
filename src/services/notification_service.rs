use tracing::{debug, info};

use crate::db::repositories::notification_repository::{NotificationRepository, NotificationRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::notification::{NotificationFilter, NotificationRecord};

pub struct NotificationService {
    db: DbPool,
}

impl NotificationService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn list_for_collaborator(
        &self,
        collaborator_id: &str,
        filter: NotificationFilter,
    ) -> AppResult<Vec<NotificationRecord>> {
        let rows = self.db.with_connection(|conn| {
            NotificationRepository::list_for_collaborator(conn, collaborator_id, filter)
        })?;
        debug!(
            target: "app::notifications",
            collaborator_id = %collaborator_id,
            ?filter,
            count = rows.len(),
            "notifications listed"
        );
        Ok(rows.into_iter().map(NotificationRow::into_record).collect())
    }

    pub fn mark_read(&self, notification_id: &str) -> AppResult<()> {
        let updated = self
            .db
            .with_connection(|conn| NotificationRepository::mark_read(conn, notification_id))?;
        if updated == 0 {
            return Err(AppError::not_found());
        }
        info!(target: "app::notifications", notification_id = %notification_id, "notification marked read");
        Ok(())
    }
}
