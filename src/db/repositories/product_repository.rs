use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use super::like_pattern;
use crate::error::AppResult;
use crate::models::product::ProductRecord;

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub category: String,
    pub base_price: f64,
    pub commission_rate: f64,
    pub cross_sell_priority: i64,
    pub created_at: String,
}

impl ProductRow {
    pub fn from_record(record: &ProductRecord) -> Self {
        Self {
            id: record.id.clone(),
            code: record.code.clone(),
            name: record.name.clone(),
            category: record.category.clone(),
            base_price: record.base_price,
            commission_rate: record.commission_rate,
            cross_sell_priority: record.cross_sell_priority,
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> ProductRecord {
        ProductRecord {
            id: self.id,
            code: self.code,
            name: self.name,
            category: self.category,
            base_price: self.base_price,
            commission_rate: self.commission_rate,
            cross_sell_priority: self.cross_sell_priority,
            created_at: self.created_at,
        }
    }
}

impl TryFrom<&Row<'_>> for ProductRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            code: row.get("code")?,
            name: row.get("name")?,
            category: row.get("category")?,
            base_price: row.get("base_price")?,
            commission_rate: row.get("commission_rate")?,
            cross_sell_priority: row.get("cross_sell_priority")?,
            created_at: row.get("created_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        code,
        name,
        category,
        base_price,
        commission_rate,
        cross_sell_priority,
        created_at
    FROM insurance_products
"#;

const SEARCH_FILTER: &str = r#"
    WHERE (
        :pattern IS NULL
        OR name LIKE :pattern ESCAPE '\'
        OR code LIKE :pattern ESCAPE '\'
        OR category LIKE :pattern ESCAPE '\'
    )
"#;

pub struct ProductRepository;

impl ProductRepository {
    pub fn insert(conn: &Connection, row: &ProductRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO insurance_products (
                    id,
                    code,
                    name,
                    category,
                    base_price,
                    commission_rate,
                    cross_sell_priority,
                    created_at
                ) VALUES (
                    :id,
                    :code,
                    :name,
                    :category,
                    :base_price,
                    :commission_rate,
                    :cross_sell_priority,
                    :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":code": &row.code,
                ":name": &row.name,
                ":category": &row.category,
                ":base_price": &row.base_price,
                ":commission_rate": &row.commission_rate,
                ":cross_sell_priority": &row.cross_sell_priority,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    pub fn code_exists(conn: &Connection, code: &str) -> AppResult<bool> {
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM insurance_products WHERE code = :code)",
            named_params! {":code": code},
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Newest first, optionally narrowed by a substring of name, code or
    /// category.
    pub fn search_page(
        conn: &Connection,
        search: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<ProductRow>> {
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
                |row| ProductRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_matching(conn: &Connection, search: Option<&str>) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM insurance_products {SEARCH_FILTER}");
        let count: i64 = conn.query_row(
            &sql,
            named_params! {":pattern": search.map(like_pattern)},
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count(conn: &Connection) -> AppResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM insurance_products", [], |row| row.get(0))?;
        Ok(count)
    }
}
