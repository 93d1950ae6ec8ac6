use serde::{Deserialize, Serialize};

use crate::models::contact::ContactStatus;

/// Inputs that moved the score, stored alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EngagementFactors {
    pub interactions_count: usize,
    pub last_interaction_days: Option<i64>,
    pub status: ContactStatus,
    pub has_email: bool,
    pub has_phone: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementScoreRecord {
    pub contact_id: String,
    pub score: i64,
    pub factors: EngagementFactors,
    pub confidence: f64,
    pub calculated_at: String,
}

/// What `ComputeEngagementScore` hands back to its caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementScoreResult {
    pub score: i64,
    pub confidence: f64,
}

impl From<&EngagementScoreRecord> for EngagementScoreResult {
    fn from(record: &EngagementScoreRecord) -> Self {
        Self {
            score: record.score,
            confidence: record.confidence,
        }
    }
}
