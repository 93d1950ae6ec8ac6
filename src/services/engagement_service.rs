use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::CrmConfig;
use crate::db::repositories::contact_repository::ContactRepository;
use crate::db::repositories::engagement_repository::{EngagementRepository, EngagementScoreRow};
use crate::db::repositories::interaction_repository::InteractionRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::contact::{ContactRecord, ContactStatus};
use crate::models::engagement::{EngagementFactors, EngagementScoreRecord, EngagementScoreResult};
use crate::utils::clock::SharedClock;
use crate::utils::time::{days_since, format_timestamp, parse_timestamp};

const BASE_SCORE: i64 = 50;
const MIN_SCORE: i64 = 0;
const MAX_SCORE: i64 = 100;

/// Everything the scoring rules look at.
#[derive(Debug, Clone)]
pub struct EngagementInputs<'a> {
    pub status: ContactStatus,
    pub has_email: bool,
    pub has_phone: bool,
    /// Newest first. Only the head is used for recency.
    pub interaction_times: &'a [DateTime<Utc>],
}

impl<'a> EngagementInputs<'a> {
    pub fn for_contact(contact: &ContactRecord, interaction_times: &'a [DateTime<Utc>]) -> Self {
        Self {
            status: contact.status,
            has_email: contact.has_email(),
            has_phone: contact.has_phone(),
            interaction_times,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngagementComputation {
    pub score: i64,
    pub confidence: f64,
    pub factors: EngagementFactors,
}

/// Rule-table engagement score, clamped to `[0, 100]`.
pub fn score_engagement(
    inputs: &EngagementInputs<'_>,
    now: DateTime<Utc>,
    confidence: f64,
) -> EngagementComputation {
    let mut score = BASE_SCORE;

    let last_interaction_days = inputs
        .interaction_times
        .first()
        .map(|latest| days_since(*latest, now));

    if let Some(days) = last_interaction_days {
        score += recency_adjustment(days);
    }

    score += volume_bonus(inputs.interaction_times.len());
    score += status_bonus(inputs.status);

    if inputs.has_email {
        score += 5;
    }
    if inputs.has_phone {
        score += 5;
    }

    EngagementComputation {
        score: score.clamp(MIN_SCORE, MAX_SCORE),
        confidence,
        factors: EngagementFactors {
            interactions_count: inputs.interaction_times.len(),
            last_interaction_days,
            status: inputs.status,
            has_email: inputs.has_email,
            has_phone: inputs.has_phone,
        },
    }
}

fn recency_adjustment(days: i64) -> i64 {
    if days <= 7 {
        20
    } else if days <= 30 {
        10
    } else {
        -10
    }
}

fn volume_bonus(count: usize) -> i64 {
    match count {
        0 | 1 => 0,
        2..=4 => 10,
        _ => 15,
    }
}

fn status_bonus(status: ContactStatus) -> i64 {
    match status {
        ContactStatus::Client => 25,
        ContactStatus::Prospect => 15,
        ContactStatus::Lead => 0,
    }
}

pub struct EngagementService {
    db: DbPool,
    clock: SharedClock,
    sample_limit: usize,
    confidence: f64,
}

impl EngagementService {
    pub fn new(db: DbPool, clock: SharedClock, config: &CrmConfig) -> Self {
        Self {
            db,
            clock,
            sample_limit: config.engagement.interaction_sample_limit,
            confidence: config.confidence.engagement,
        }
    }

    /// Scores the contact from its newest interactions and upserts the result.
    pub fn compute_score(&self, contact_id: &str) -> AppResult<EngagementScoreResult> {
        let conn = self.db.get_connection()?;

        let contact = ContactRepository::find_by_id(&conn, contact_id)?
            .ok_or_else(AppError::not_found)?
            .into_record()?;

        let interaction_times = InteractionRepository::list_recent(&conn, contact_id, self.sample_limit)?
            .iter()
            .map(|row| parse_timestamp(&row.created_at))
            .collect::<AppResult<Vec<_>>>()?;

        let now = self.clock.now();
        let computation = score_engagement(
            &EngagementInputs::for_contact(&contact, &interaction_times),
            now,
            self.confidence,
        );
        debug!(
            target: "app::engagement",
            contact_id = %contact_id,
            factors = ?computation.factors,
            "engagement factors collected"
        );

        let record = EngagementScoreRecord {
            contact_id: contact.id.clone(),
            score: computation.score,
            factors: computation.factors,
            confidence: computation.confidence,
            calculated_at: format_timestamp(now),
        };

        let row = EngagementScoreRow::from_record(&record)?;
        EngagementRepository::upsert_score(&conn, &row)?;

        info!(
            target: "app::engagement",
            contact_id = %record.contact_id,
            score = record.score,
            "engagement score stored"
        );

        Ok(EngagementScoreResult::from(&record))
    }

    pub fn get_score(&self, contact_id: &str) -> AppResult<EngagementScoreRecord> {
        self.db
            .with_connection(|conn| EngagementRepository::find_by_contact(conn, contact_id))?
            .ok_or_else(AppError::not_found)?
            .into_record()
    }
}
