use serde::{Deserialize, Serialize};

use crate::utils::pagination::Pagination;

pub const DEFAULT_COMMISSION_RATE: f64 = 0.05;

/// An insurance product offered by the brokerage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub code: String,
    pub name: String,
    /// Free text, e.g. Vie, Automobile, Santé, Habitation.
    pub category: String,
    pub base_price: f64,
    /// Fraction of the premium paid as commission, within [0, 1].
    pub commission_rate: f64,
    pub cross_sell_priority: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreateInput {
    pub code: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default)]
    pub commission_rate: Option<f64>,
    #[serde(default)]
    pub cross_sell_priority: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub data: Vec<ProductRecord>,
    pub pagination: Pagination,
}
