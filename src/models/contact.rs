use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Lead,
    Prospect,
    Client,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Lead => "lead",
            ContactStatus::Prospect => "prospect",
            ContactStatus::Client => "client",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ContactStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "lead" => Ok(ContactStatus::Lead),
            "prospect" => Ok(ContactStatus::Prospect),
            "client" => Ok(ContactStatus::Client),
            other => Err(format!("unsupported contact status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: String,
    pub client_code: String,
    pub first_name: String,
    pub last_name: String,
    pub status: ContactStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ContactRecord {
    pub fn has_email(&self) -> bool {
        has_text(self.email.as_deref())
    }

    pub fn has_phone(&self) -> bool {
        has_text(self.phone.as_deref())
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactCreateInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub client_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}
