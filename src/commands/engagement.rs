use serde::Deserialize;
use tracing::debug;

use crate::models::engagement::{EngagementScoreRecord, EngagementScoreResult};

use super::{require_field, run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub contact_id: String,
}

pub async fn engagement_compute_score(
    state: &AppState,
    request: ContactRequest,
) -> CommandResult<EngagementScoreResult> {
    let contact_id = require_field(&request.contact_id, "contactId")?;
    debug!(target: "app::command", contact_id = %contact_id, "engagement_compute_score");
    let service = state.engagement();
    run_blocking(move || service.compute_score(&contact_id)).await
}

pub async fn engagement_get_score(
    state: &AppState,
    request: ContactRequest,
) -> CommandResult<EngagementScoreRecord> {
    let contact_id = require_field(&request.contact_id, "contactId")?;
    let service = state.engagement();
    run_blocking(move || service.get_score(&contact_id)).await
}
