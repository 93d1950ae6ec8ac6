use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use super::like_pattern;
use crate::error::{AppError, AppResult};
use crate::models::contract::{ContractRecord, ContractStatus};

#[derive(Debug, Clone)]
pub struct ContractRow {
    pub id: String,
    pub contact_id: String,
    pub contract_number: String,
    pub product_name: String,
    pub status: String,
    pub monthly_premium: f64,
    pub annual_premium: f64,
    pub received_commission: f64,
    pub assigned_to: Option<String>,
    pub created_at: String,
}

impl ContractRow {
    pub fn from_record(record: &ContractRecord) -> Self {
        Self {
            id: record.id.clone(),
            contact_id: record.contact_id.clone(),
            contract_number: record.contract_number.clone(),
            product_name: record.product_name.clone(),
            status: record.status.as_str().to_string(),
            monthly_premium: record.monthly_premium,
            annual_premium: record.annual_premium,
            received_commission: record.received_commission,
            assigned_to: record.assigned_to.clone(),
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<ContractRecord> {
        let status =
            ContractStatus::try_from(self.status.as_str()).map_err(AppError::validation)?;

        Ok(ContractRecord {
            id: self.id,
            contact_id: self.contact_id,
            contract_number: self.contract_number,
            product_name: self.product_name,
            status,
            monthly_premium: self.monthly_premium,
            annual_premium: self.annual_premium,
            received_commission: self.received_commission,
            assigned_to: self.assigned_to,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<&Row<'_>> for ContractRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            contact_id: row.get("contact_id")?,
            contract_number: row.get("contract_number")?,
            product_name: row.get("product_name")?,
            status: row.get("status")?,
            monthly_premium: row.get("monthly_premium")?,
            annual_premium: row.get("annual_premium")?,
            received_commission: row.get("received_commission")?,
            assigned_to: row.get("assigned_to")?,
            created_at: row.get("created_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        contact_id,
        contract_number,
        product_name,
        status,
        monthly_premium,
        annual_premium,
        received_commission,
        assigned_to,
        created_at
    FROM contracts
"#;

const SEARCH_FILTER: &str = r#"
    WHERE (
        :pattern IS NULL
        OR contract_number LIKE :pattern ESCAPE '\'
        OR product_name LIKE :pattern ESCAPE '\'
    )
"#;

pub struct ContractRepository;

impl ContractRepository {
    pub fn insert(conn: &Connection, row: &ContractRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO contracts (
                    id,
                    contact_id,
                    contract_number,
                    product_name,
                    status,
                    monthly_premium,
                    annual_premium,
                    received_commission,
                    assigned_to,
                    created_at
                ) VALUES (
                    :id,
                    :contact_id,
                    :contract_number,
                    :product_name,
                    :status,
                    :monthly_premium,
                    :annual_premium,
                    :received_commission,
                    :assigned_to,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":contact_id": &row.contact_id,
                ":contract_number": &row.contract_number,
                ":product_name": &row.product_name,
                ":status": &row.status,
                ":monthly_premium": &row.monthly_premium,
                ":annual_premium": &row.annual_premium,
                ":received_commission": &row.received_commission,
                ":assigned_to": &row.assigned_to,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &ContractRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE contracts SET
                    contract_number = :contract_number,
                    product_name = :product_name,
                    status = :status,
                    monthly_premium = :monthly_premium,
                    annual_premium = :annual_premium,
                    received_commission = :received_commission,
                    assigned_to = :assigned_to
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":contract_number": &row.contract_number,
                ":product_name": &row.product_name,
                ":status": &row.status,
                ":monthly_premium": &row.monthly_premium,
                ":annual_premium": &row.annual_premium,
                ":received_commission": &row.received_commission,
                ":assigned_to": &row.assigned_to,
            },
        )?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM contracts WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ContractRow>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! {":id": id}, |row| ContractRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn count_for_contact(conn: &Connection, contact_id: &str) -> AppResult<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM contracts WHERE contact_id = :contact_id",
            named_params! {":contact_id": contact_id},
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn contract_number_exists(conn: &Connection, contract_number: &str) -> AppResult<bool> {
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contracts WHERE contract_number = :contract_number)",
            named_params! {":contract_number": contract_number},
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Whether a contract other than `id` already carries `contract_number`.
    pub fn contract_number_taken(
        conn: &Connection,
        contract_number: &str,
        id: &str,
    ) -> AppResult<bool> {
        let taken = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contracts WHERE contract_number = :contract_number AND id <> :id)",
            named_params! {":contract_number": contract_number, ":id": id},
            |row| row.get(0),
        )?;
        Ok(taken)
    }

    /// Case-insensitive substring search over contract number and product name.
    pub fn search_page(
        conn: &Connection,
        search: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<ContractRow>> {
        let sql = format!(
            "{SELECT_COLUMNS} {SEARCH_FILTER} ORDER BY created_at DESC, id LIMIT :limit OFFSET :offset"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":pattern": search.map(like_pattern),
                    ":limit": i64::from(limit),
                    ":offset": offset as i64,
                },
                |row| ContractRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_matching(conn: &Connection, search: Option<&str>) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM contracts {SEARCH_FILTER}");
        let count: i64 = conn.query_row(
            &sql,
            named_params! {":pattern": search.map(like_pattern)},
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_by_status(conn: &Connection, status: ContractStatus) -> AppResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM contracts WHERE status = :status",
            named_params! {":status": status.as_str()},
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn total_received_commission(conn: &Connection) -> AppResult<f64> {
        let total = conn.query_row(
            "SELECT COALESCE(SUM(received_commission), 0.0) FROM contracts",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}
