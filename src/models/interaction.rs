use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub id: String,
    pub contact_id: String,
    pub interaction_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionCreateInput {
    pub contact_id: String,
    pub interaction_type: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the current time when absent.
    #[serde(default)]
    pub occurred_at: Option<String>,
}
