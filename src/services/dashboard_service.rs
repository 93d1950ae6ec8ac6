use tracing::debug;

use crate::db::repositories::contact_repository::ContactRepository;
use crate::db::repositories::contract_repository::ContractRepository;
use crate::db::repositories::product_repository::ProductRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::contact::ContactStatus;
use crate::models::contract::ContractStatus;
use crate::models::stats::DashboardStats;

pub struct DashboardService {
    db: DbPool,
}

impl DashboardService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn stats(&self) -> AppResult<DashboardStats> {
        let stats = self.db.with_connection(|conn| {
            let total_contacts = ContactRepository::count(conn, None)?;
            let new_leads = ContactRepository::count(conn, Some(ContactStatus::Lead))?;
            let clients_won = ContactRepository::count(conn, Some(ContactStatus::Client))?;
            let total_commissions = ContractRepository::total_received_commission(conn)?;
            let active_contracts =
                ContractRepository::count_by_status(conn, ContractStatus::Active)?;
            let total_products = ProductRepository::count(conn)?;
            let total_collaborators = ContactRepository::count_collaborators(conn)?;

            Ok(DashboardStats {
                total_contacts,
                new_leads,
                clients_won,
                conversion_rate: conversion_rate(clients_won, total_contacts),
                total_commissions,
                active_contracts,
                total_products,
                total_collaborators,
            })
        })?;
        debug!(target: "app::dashboard", ?stats, "dashboard stats computed");
        Ok(stats)
    }
}

/// Rounded percentage; zero when there are no contacts.
pub fn conversion_rate(clients: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (clients as f64 / total as f64 * 100.0).round() as i64
}
