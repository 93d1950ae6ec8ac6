use std::ops::Deref;

use tracing::{debug, info};

use crate::db::repositories::contact_repository::ContactRepository;
use crate::db::repositories::contract_repository::{ContractRepository, ContractRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::contract::{
    ContractCreateInput, ContractListParams, ContractPage, ContractRecord, ContractStatus,
    ContractUpdateInput,
};
use crate::utils::clock::SharedClock;
use crate::utils::pagination::PageRequest;
use crate::utils::time::format_timestamp;

pub struct ContractService {
    db: DbPool,
    clock: SharedClock,
}

impl ContractService {
    pub fn new(db: DbPool, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    pub fn create_contract(&self, input: ContractCreateInput) -> AppResult<ContractRecord> {
        let mut record = build_record_from_create(input)?;
        record.id = uuid::Uuid::new_v4().to_string();
        record.created_at = format_timestamp(self.clock.now());

        self.db.with_connection(|conn| {
            ContactRepository::find_by_id(conn, &record.contact_id)?
                .ok_or_else(AppError::not_found)?;
            if ContractRepository::contract_number_exists(conn, &record.contract_number)? {
                return Err(AppError::conflict(format!(
                    "contract number {} is already used",
                    record.contract_number
                )));
            }
            ContractRepository::insert(conn, &ContractRow::from_record(&record))
        })?;

        info!(
            target: "app::crm",
            contract_id = %record.id,
            contact_id = %record.contact_id,
            status = %record.status,
            "contract created"
        );
        Ok(record)
    }

    pub fn get_contract(&self, id: &str) -> AppResult<ContractRecord> {
        self.db
            .with_connection(|conn| ContractRepository::find_by_id(conn, id))?
            .ok_or_else(AppError::not_found)?
            .into_record()
    }

    /// Applies a partial update. The owning contact never changes.
    pub fn update_contract(
        &self,
        id: &str,
        update: ContractUpdateInput,
    ) -> AppResult<ContractRecord> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;
        let tx_conn = tx.deref();

        let mut record = ContractRepository::find_by_id(tx_conn, id)?
            .ok_or_else(AppError::not_found)?
            .into_record()?;
        apply_update(&mut record, update)?;

        if ContractRepository::contract_number_taken(tx_conn, &record.contract_number, &record.id)? {
            return Err(AppError::conflict(format!(
                "contract number {} is already used",
                record.contract_number
            )));
        }
        ContractRepository::update(tx_conn, &ContractRow::from_record(&record))?;
        tx.commit()?;

        info!(
            target: "app::crm",
            contract_id = %record.id,
            status = %record.status,
            "contract updated"
        );
        Ok(record)
    }

    pub fn delete_contract(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| ContractRepository::delete(conn, id))?;
        info!(target: "app::crm", contract_id = %id, "contract deleted");
        Ok(())
    }

    /// One page of contracts, newest first, optionally narrowed by a search
    /// term matched against contract number and product name.
    pub fn list_contracts(&self, params: ContractListParams) -> AppResult<ContractPage> {
        let request = PageRequest::new(params.page, params.limit)?;
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());

        let (rows, total) = self.db.with_connection(|conn| {
            let rows =
                ContractRepository::search_page(conn, search, request.limit, request.offset())?;
            let total = ContractRepository::count_matching(conn, search)?;
            Ok((rows, total))
        })?;

        let data = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;
        debug!(
            target: "app::crm",
            page = request.page,
            returned = data.len(),
            total,
            "contracts listed"
        );

        Ok(ContractPage {
            data,
            pagination: request.describe(total),
        })
    }
}

fn build_record_from_create(input: ContractCreateInput) -> AppResult<ContractRecord> {
    let contact_id = required(&input.contact_id, "contact id")?;
    let contract_number = required(&input.contract_number, "contract number")?;
    let product_name = required(&input.product_name, "product name")?;
    let status = match input.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => ContractStatus::try_from(raw.to_lowercase().as_str())
            .map_err(AppError::validation)?,
        None => ContractStatus::Pending,
    };

    validate_amounts(
        input.monthly_premium,
        input.annual_premium,
        input.received_commission,
    )?;

    Ok(ContractRecord {
        id: String::new(),
        contact_id,
        contract_number,
        product_name,
        status,
        monthly_premium: input.monthly_premium,
        annual_premium: input.annual_premium,
        received_commission: input.received_commission,
        assigned_to: input
            .assigned_to
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        created_at: String::new(),
    })
}

fn apply_update(record: &mut ContractRecord, update: ContractUpdateInput) -> AppResult<()> {
    if let Some(contract_number) = update.contract_number {
        record.contract_number = required(&contract_number, "contract number")?;
    }

    if let Some(product_name) = update.product_name {
        record.product_name = required(&product_name, "product name")?;
    }

    if let Some(status) = update.status {
        record.status = ContractStatus::try_from(status.trim().to_lowercase().as_str())
            .map_err(AppError::validation)?;
    }

    if let Some(amount) = update.monthly_premium {
        record.monthly_premium = amount;
    }

    if let Some(amount) = update.annual_premium {
        record.annual_premium = amount;
    }

    if let Some(amount) = update.received_commission {
        record.received_commission = amount;
    }

    if let Some(assigned_to) = update.assigned_to {
        record.assigned_to = assigned_to
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }

    validate_amounts(
        record.monthly_premium,
        record.annual_premium,
        record.received_commission,
    )
}

fn validate_amounts(monthly: f64, annual: f64, commission: f64) -> AppResult<()> {
    for (field, amount) in [
        ("monthly premium", monthly),
        ("annual premium", annual),
        ("received commission", commission),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::validation_with_details(
                format!("{field} must be a non-negative amount"),
                serde_json::json!({ "field": field, "value": amount.to_string() }),
            ));
        }
    }
    Ok(())
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
