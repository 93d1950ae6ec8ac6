use tracing::{debug, info};

use crate::db::repositories::product_repository::{ProductRepository, ProductRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::product::{
    ProductCreateInput, ProductListParams, ProductPage, ProductRecord, DEFAULT_COMMISSION_RATE,
};
use crate::utils::clock::SharedClock;
use crate::utils::pagination::PageRequest;
use crate::utils::time::format_timestamp;

pub struct ProductService {
    db: DbPool,
    clock: SharedClock,
}

impl ProductService {
    pub fn new(db: DbPool, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    pub fn create_product(&self, input: ProductCreateInput) -> AppResult<ProductRecord> {
        let mut record = build_record_from_create(input)?;
        record.id = uuid::Uuid::new_v4().to_string();
        record.created_at = format_timestamp(self.clock.now());

        self.db.with_connection(|conn| {
            if ProductRepository::code_exists(conn, &record.code)? {
                return Err(AppError::conflict(format!(
                    "product code {} is already used",
                    record.code
                )));
            }
            ProductRepository::insert(conn, &ProductRow::from_record(&record))
        })?;

        info!(
            target: "app::crm",
            product_id = %record.id,
            code = %record.code,
            category = %record.category,
            "product created"
        );
        Ok(record)
    }

    /// One page of the catalog, newest first, optionally narrowed by a
    /// search term matched against name, code and category.
    pub fn list_products(&self, params: ProductListParams) -> AppResult<ProductPage> {
        let request = PageRequest::new(params.page, params.limit)?;
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());

        let (rows, total) = self.db.with_connection(|conn| {
            let rows =
                ProductRepository::search_page(conn, search, request.limit, request.offset())?;
            let total = ProductRepository::count_matching(conn, search)?;
            Ok((rows, total))
        })?;

        let data: Vec<ProductRecord> = rows.into_iter().map(ProductRow::into_record).collect();
        debug!(target: "app::crm", page = request.page, returned = data.len(), total, "products listed");

        Ok(ProductPage {
            data,
            pagination: request.describe(total),
        })
    }
}

fn build_record_from_create(input: ProductCreateInput) -> AppResult<ProductRecord> {
    let code = required(&input.code, "code")?;
    let name = required(&input.name, "name")?;
    let category = required(&input.category, "category")?;

    if !input.base_price.is_finite() || input.base_price < 0.0 {
        return Err(AppError::validation_with_details(
            "base price must be a non-negative amount",
            serde_json::json!({ "field": "basePrice", "value": input.base_price.to_string() }),
        ));
    }
    let commission_rate = input.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE);
    if !(0.0..=1.0).contains(&commission_rate) {
        return Err(AppError::validation_with_details(
            "commission rate must be within [0, 1]",
            serde_json::json!({ "field": "commissionRate", "value": commission_rate.to_string() }),
        ));
    }

    Ok(ProductRecord {
        id: String::new(),
        code,
        name,
        category,
        base_price: input.base_price,
        commission_rate,
        cross_sell_priority: input.cross_sell_priority.unwrap_or(0),
        created_at: String::new(),
    })
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation_with_details(
            format!("{field} is required"),
            serde_json::json!({ "field": field }),
        ));
    }
    Ok(trimmed.to_string())
}
