use serde::Deserialize;
use tracing::debug;

use crate::models::suggestion::{GeneratedSuggestions, ReviewDecision, SuggestionRecord};

use super::engagement::ContactRequest;
use super::{require_field, run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateSuggestionsRequest {
    pub contact_id: String,
    pub actor_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSuggestionRequest {
    #[serde(default)]
    pub suggestion_id: String,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub actor_id: String,
}

pub async fn suggestions_generate(
    state: &AppState,
    request: GenerateSuggestionsRequest,
) -> CommandResult<GeneratedSuggestions> {
    let contact_id = require_field(&request.contact_id, "contactId")?;
    let actor_id = require_field(&request.actor_id, "actorId")?;
    debug!(target: "app::command", contact_id = %contact_id, "suggestions_generate");
    let service = state.suggestions();
    let suggestions = run_blocking(move || service.generate(&contact_id, &actor_id)).await?;
    Ok(GeneratedSuggestions { suggestions })
}

pub async fn suggestions_review(
    state: &AppState,
    request: ReviewSuggestionRequest,
) -> CommandResult<SuggestionRecord> {
    let suggestion_id = require_field(&request.suggestion_id, "suggestionId")?;
    let actor_id = require_field(&request.actor_id, "actorId")?;
    let decision = request.decision;
    debug!(target: "app::command", suggestion_id = %suggestion_id, ?decision, "suggestions_review");
    let service = state.suggestions();
    run_blocking(move || service.review(&suggestion_id, decision, &actor_id)).await
}

pub async fn suggestions_list_pending(
    state: &AppState,
    request: ContactRequest,
) -> CommandResult<Vec<SuggestionRecord>> {
    let contact_id = require_field(&request.contact_id, "contactId")?;
    let service = state.suggestions();
    run_blocking(move || service.list_pending(&contact_id)).await
}
