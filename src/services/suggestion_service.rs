use std::ops::Deref;

use chrono::Duration;
use rusqlite::TransactionBehavior;
use tracing::{debug, info, warn};

use crate::config::{ConfidenceTable, CrmConfig};
use crate::db::repositories::contact_repository::ContactRepository;
use crate::db::repositories::contract_repository::ContractRepository;
use crate::db::repositories::interaction_repository::InteractionRepository;
use crate::db::repositories::notification_repository::{NotificationRepository, NotificationRow};
use crate::db::repositories::suggestion_repository::{SuggestionRepository, SuggestionRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::contact::{ContactRecord, ContactStatus};
use crate::models::notification::NotificationRecord;
use crate::models::suggestion::{
    ReviewDecision, SuggestionDraft, SuggestionPriority, SuggestionRecord, SuggestionStatus,
    SuggestionType,
};
use crate::utils::clock::SharedClock;
use crate::utils::time::format_timestamp;

pub const SUGGESTIONS_NOTIFICATION_TYPE: &str = "ai_suggestions";

const FOLLOW_UP_TITLE: &str = "Follow-up recommended";
const FOLLOW_UP_DESCRIPTION: &str =
    "This contact has had no recent interaction. A follow-up could help.";
const CROSS_SELL_TITLE: &str = "Cross-sell opportunity";
const CROSS_SELL_DESCRIPTION: &str =
    "This client holds a single contract. Offer complementary products.";
const ACTION_TITLE: &str = "Commercial proposal";
const ACTION_DESCRIPTION: &str =
    "This prospect looks ready for a personalised commercial proposal.";

/// What the rules know about a contact at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionSignals {
    pub status: ContactStatus,
    pub recent_interactions: usize,
    /// Only fetched for clients.
    pub contract_count: Option<usize>,
}

/// Applies the three independent rules. Output order is follow-up,
/// cross-sell, action.
pub fn evaluate_rules(signals: &SuggestionSignals, table: &ConfidenceTable) -> Vec<SuggestionDraft> {
    let mut drafts = Vec::new();

    if signals.recent_interactions == 0 {
        drafts.push(SuggestionDraft {
            suggestion_type: SuggestionType::FollowUp,
            title: FOLLOW_UP_TITLE,
            description: FOLLOW_UP_DESCRIPTION,
            confidence_score: table.follow_up,
            priority: SuggestionPriority::Medium,
        });
    }

    // Exactly one contract; none and several both stay silent.
    if signals.status == ContactStatus::Client && signals.contract_count == Some(1) {
        drafts.push(SuggestionDraft {
            suggestion_type: SuggestionType::CrossSell,
            title: CROSS_SELL_TITLE,
            description: CROSS_SELL_DESCRIPTION,
            confidence_score: table.cross_sell,
            priority: SuggestionPriority::High,
        });
    }

    if signals.status == ContactStatus::Prospect {
        drafts.push(SuggestionDraft {
            suggestion_type: SuggestionType::Action,
            title: ACTION_TITLE,
            description: ACTION_DESCRIPTION,
            confidence_score: table.action,
            priority: SuggestionPriority::Medium,
        });
    }

    drafts
}

pub struct SuggestionService {
    db: DbPool,
    clock: SharedClock,
    recent_window_days: i64,
    confidence: ConfidenceTable,
}

impl SuggestionService {
    pub fn new(db: DbPool, clock: SharedClock, config: &CrmConfig) -> Self {
        Self {
            db,
            clock,
            recent_window_days: config.suggestions.recent_window_days,
            confidence: config.confidence,
        }
    }

    /// Evaluates the rules for one contact and stores any suggestions in a
    /// single transaction, together with a notification for `actor_id`.
    pub fn generate(&self, contact_id: &str, actor_id: &str) -> AppResult<Vec<SuggestionRecord>> {
        let actor_id = require_actor(actor_id)?;
        let mut conn = self.db.get_connection()?;

        let contact = ContactRepository::find_by_id(&conn, contact_id)?
            .ok_or_else(AppError::not_found)?
            .into_record()?;

        let now = self.clock.now();
        let cutoff = Duration::try_days(self.recent_window_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                AppError::config(format!(
                    "recent window of {} days is out of range",
                    self.recent_window_days
                ))
            })?;
        let since = format_timestamp(cutoff);
        let recent_interactions = InteractionRepository::count_since(&conn, contact_id, &since)?;

        let contract_count = if contact.status == ContactStatus::Client {
            Some(ContractRepository::count_for_contact(&conn, contact_id)?)
        } else {
            None
        };

        let signals = SuggestionSignals {
            status: contact.status,
            recent_interactions,
            contract_count,
        };
        debug!(target: "app::suggestions", contact_id = %contact_id, ?signals, "suggestion signals collected");

        let created_at = format_timestamp(now);
        let suggestions: Vec<SuggestionRecord> = evaluate_rules(&signals, &self.confidence)
            .into_iter()
            .map(|draft| SuggestionRecord {
                id: uuid::Uuid::new_v4().to_string(),
                contact_id: contact.id.clone(),
                suggestion_type: draft.suggestion_type,
                title: draft.title.to_string(),
                description: draft.description.to_string(),
                confidence_score: draft.confidence_score,
                priority: draft.priority,
                status: SuggestionStatus::Pending,
                created_at: created_at.clone(),
                reviewed_by: None,
                reviewed_at: None,
            })
            .collect();

        if suggestions.is_empty() {
            debug!(target: "app::suggestions", contact_id = %contact_id, "no suggestion produced");
            return Ok(suggestions);
        }

        let rows: Vec<SuggestionRow> = suggestions.iter().map(SuggestionRow::from_record).collect();
        let notification = build_notification(&contact, actor_id, suggestions.len(), &created_at);

        let tx = conn.transaction()?;
        let tx_conn = tx.deref();
        SuggestionRepository::insert_batch(tx_conn, &rows)?;
        NotificationRepository::insert(tx_conn, &NotificationRow::from_record(&notification))?;
        tx.commit()?;

        info!(
            target: "app::suggestions",
            contact_id = %contact_id,
            actor_id = %actor_id,
            count = suggestions.len(),
            "suggestions generated"
        );

        Ok(suggestions)
    }

    /// Moves a pending suggestion to a terminal status.
    ///
    /// Re-applying the decision a suggestion already carries is a no-op;
    /// flipping an accepted suggestion to rejected (or back) is a conflict.
    pub fn review(
        &self,
        suggestion_id: &str,
        decision: ReviewDecision,
        actor_id: &str,
    ) -> AppResult<SuggestionRecord> {
        let actor_id = require_actor(actor_id)?;
        let target = SuggestionStatus::from(decision);
        let mut conn = self.db.get_connection()?;

        // Take the write lock up front so concurrent reviews serialize.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tx_conn = tx.deref();

        let mut record = SuggestionRepository::find_by_id(tx_conn, suggestion_id)?
            .ok_or_else(AppError::not_found)?
            .into_record()?;

        if record.status == target {
            debug!(target: "app::suggestions", suggestion_id = %suggestion_id, status = %target, "review already applied");
            return Ok(record);
        }

        if record.status.is_terminal() {
            warn!(
                target: "app::suggestions",
                suggestion_id = %suggestion_id,
                current = %record.status,
                requested = %target,
                "attempt to overturn a reviewed suggestion"
            );
            return Err(AppError::conflict(format!(
                "suggestion {suggestion_id} was already {}",
                record.status
            )));
        }

        let reviewed_at = format_timestamp(self.clock.now());
        let updated =
            SuggestionRepository::update_status(tx_conn, suggestion_id, target, actor_id, &reviewed_at)?;
        if updated == 0 {
            return Err(AppError::conflict(format!(
                "suggestion {suggestion_id} is no longer pending"
            )));
        }
        tx.commit()?;

        record.status = target;
        record.reviewed_by = Some(actor_id.to_string());
        record.reviewed_at = Some(reviewed_at);

        info!(
            target: "app::suggestions",
            suggestion_id = %suggestion_id,
            status = %target,
            actor_id = %actor_id,
            "suggestion reviewed"
        );

        Ok(record)
    }

    /// Pending suggestions for a contact, highest confidence first.
    pub fn list_pending(&self, contact_id: &str) -> AppResult<Vec<SuggestionRecord>> {
        self.db.with_connection(|conn| {
            ContactRepository::find_by_id(conn, contact_id)?.ok_or_else(AppError::not_found)?;
            SuggestionRepository::list_for_contact(conn, contact_id, Some(SuggestionStatus::Pending))?
                .into_iter()
                .map(|row| row.into_record())
                .collect()
        })
    }

    pub fn get(&self, suggestion_id: &str) -> AppResult<SuggestionRecord> {
        self.db
            .with_connection(|conn| SuggestionRepository::find_by_id(conn, suggestion_id))?
            .ok_or_else(AppError::not_found)?
            .into_record()
    }
}

fn require_actor(actor_id: &str) -> AppResult<&str> {
    let trimmed = actor_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("actor id is required"));
    }
    Ok(trimmed)
}

fn build_notification(
    contact: &ContactRecord,
    actor_id: &str,
    count: usize,
    created_at: &str,
) -> NotificationRecord {
    let plural = if count == 1 { "" } else { "s" };
    NotificationRecord {
        id: uuid::Uuid::new_v4().to_string(),
        collaborator_id: actor_id.to_string(),
        title: "New suggestions".to_string(),
        message: format!(
            "{count} new suggestion{plural} for {} {} ({})",
            contact.first_name, contact.last_name, contact.client_code
        ),
        notification_type: SUGGESTIONS_NOTIFICATION_TYPE.to_string(),
        contact_id: Some(contact.id.clone()),
        is_read: false,
        created_at: created_at.to_string(),
    }
}
