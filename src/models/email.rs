use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::pagination::Pagination;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailDirection {
    Outbound,
    Inbound,
}

impl EmailDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailDirection::Outbound => "outbound",
            EmailDirection::Inbound => "inbound",
        }
    }
}

impl fmt::Display for EmailDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EmailDirection {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "outbound" => Ok(EmailDirection::Outbound),
            "inbound" => Ok(EmailDirection::Inbound),
            other => Err(format!("unsupported email type: {other}")),
        }
    }
}

/// A logged email. Nothing here sends mail; the record only documents an
/// exchange with a contact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    pub collaborator_id: String,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub email_type: EmailDirection,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailCreateInput {
    #[serde(default)]
    pub contact_id: Option<String>,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    #[serde(default)]
    pub body: Option<String>,
    /// `outbound` when omitted.
    #[serde(default)]
    pub email_type: Option<String>,
    /// RFC 3339; the current time when omitted.
    #[serde(default)]
    pub sent_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailFilter {
    #[default]
    All,
    Sent,
    Received,
}

impl EmailFilter {
    pub fn direction(&self) -> Option<EmailDirection> {
        match self {
            EmailFilter::All => None,
            EmailFilter::Sent => Some(EmailDirection::Outbound),
            EmailFilter::Received => Some(EmailDirection::Inbound),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailListParams {
    #[serde(default)]
    pub filter: EmailFilter,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailPage {
    pub data: Vec<EmailRecord>,
    pub pagination: Pagination,
}
