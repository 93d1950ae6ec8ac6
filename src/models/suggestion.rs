use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    FollowUp,
    CrossSell,
    Action,
}

impl SuggestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::FollowUp => "follow_up",
            SuggestionType::CrossSell => "cross_sell",
            SuggestionType::Action => "action",
        }
    }
}

impl fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SuggestionType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "follow_up" => Ok(SuggestionType::FollowUp),
            "cross_sell" => Ok(SuggestionType::CrossSell),
            "action" => Ok(SuggestionType::Action),
            other => Err(format!("unsupported suggestion type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    Low,
    Medium,
    High,
}

impl SuggestionPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionPriority::Low => "low",
            SuggestionPriority::Medium => "medium",
            SuggestionPriority::High => "high",
        }
    }
}

impl fmt::Display for SuggestionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SuggestionPriority {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(SuggestionPriority::Low),
            "medium" => Ok(SuggestionPriority::Medium),
            "high" => Ok(SuggestionPriority::High),
            other => Err(format!("unsupported suggestion priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SuggestionStatus::Pending)
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SuggestionStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(SuggestionStatus::Pending),
            "accepted" => Ok(SuggestionStatus::Accepted),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(format!("unsupported suggestion status: {other}")),
        }
    }
}

/// A reviewer's verdict. `pending` is deliberately not representable here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Accepted,
    Rejected,
}

impl From<ReviewDecision> for SuggestionStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Accepted => SuggestionStatus::Accepted,
            ReviewDecision::Rejected => SuggestionStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub id: String,
    pub contact_id: String,
    pub suggestion_type: SuggestionType,
    pub title: String,
    pub description: String,
    pub confidence_score: f64,
    pub priority: SuggestionPriority,
    pub status: SuggestionStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
}

/// Output of the rule table before ids and timestamps are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionDraft {
    pub suggestion_type: SuggestionType,
    pub title: &'static str,
    pub description: &'static str,
    pub confidence_score: f64,
    pub priority: SuggestionPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSuggestions {
    pub suggestions: Vec<SuggestionRecord>,
}
