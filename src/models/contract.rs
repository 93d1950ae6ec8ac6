use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::pagination::Pagination;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Active,
    Pending,
    Cancelled,
    Expired,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Pending => "pending",
            ContractStatus::Cancelled => "cancelled",
            ContractStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ContractStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(ContractStatus::Active),
            "pending" => Ok(ContractStatus::Pending),
            "cancelled" => Ok(ContractStatus::Cancelled),
            "expired" => Ok(ContractStatus::Expired),
            other => Err(format!("unsupported contract status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub id: String,
    pub contact_id: String,
    pub contract_number: String,
    pub product_name: String,
    pub status: ContractStatus,
    pub monthly_premium: f64,
    pub annual_premium: f64,
    pub received_commission: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractCreateInput {
    pub contact_id: String,
    pub contract_number: String,
    pub product_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub monthly_premium: f64,
    #[serde(default)]
    pub annual_premium: f64,
    #[serde(default)]
    pub received_commission: f64,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

/// Partial update; absent fields keep their stored value. For
/// `assigned_to`, `Some(None)` clears the assignee.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractUpdateInput {
    #[serde(default)]
    pub contract_number: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub monthly_premium: Option<f64>,
    #[serde(default)]
    pub annual_premium: Option<f64>,
    #[serde(default)]
    pub received_commission: Option<f64>,
    #[serde(default)]
    pub assigned_to: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractPage {
    pub data: Vec<ContractRecord>,
    pub pagination: Pagination,
}
