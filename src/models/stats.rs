use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_contacts: i64,
    pub new_leads: i64,
    pub clients_won: i64,
    /// Percentage of contacts that became clients, rounded to an integer.
    pub conversion_rate: i64,
    pub total_commissions: f64,
    pub active_contracts: i64,
    pub total_products: i64,
    /// Distinct collaborator ids referenced by contacts, contracts,
    /// interactions and emails.
    pub total_collaborators: i64,
}
