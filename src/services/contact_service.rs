use tracing::{debug, info};

use crate::db::repositories::contact_repository::{ContactRepository, ContactRow};
use crate::db::repositories::interaction_repository::{InteractionRepository, InteractionRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::contact::{ContactCreateInput, ContactRecord, ContactStatus};
use crate::models::interaction::{InteractionCreateInput, InteractionRecord};
use crate::utils::clock::SharedClock;
use crate::utils::redact::{mask_email, mask_phone};
use crate::utils::time::{format_timestamp, normalize_timestamp};

const MAX_NAME_LENGTH: usize = 120;
const CLIENT_CODE_PREFIX: &str = "CL-";
const DEFAULT_INTERACTION_PAGE: usize = 50;
const MAX_INTERACTION_PAGE: usize = 500;

pub struct ContactService {
    db: DbPool,
    clock: SharedClock,
}

impl ContactService {
    pub fn new(db: DbPool, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    pub fn create_contact(&self, input: ContactCreateInput) -> AppResult<ContactRecord> {
        let mut record = build_record_from_create(input)?;
        let now = format_timestamp(self.clock.now());
        record.id = uuid::Uuid::new_v4().to_string();
        record.created_at = now.clone();
        record.updated_at = now;

        let conn = self.db.get_connection()?;
        if record.client_code.is_empty() {
            record.client_code = generate_client_code();
        } else if ContactRepository::client_code_exists(&conn, &record.client_code)? {
            return Err(AppError::conflict(format!(
                "client code {} is already used",
                record.client_code
            )));
        }

        ContactRepository::insert(&conn, &ContactRow::from_record(&record))?;

        info!(
            target: "app::crm",
            contact_id = %record.id,
            client_code = %record.client_code,
            status = %record.status,
            email = %record.email.as_deref().map(mask_email).unwrap_or_default(),
            phone = %record.phone.as_deref().map(mask_phone).unwrap_or_default(),
            "contact created"
        );
        Ok(record)
    }

    pub fn get_contact(&self, id: &str) -> AppResult<ContactRecord> {
        let row = self
            .db
            .with_connection(|conn| ContactRepository::find_by_id(conn, id))?
            .ok_or_else(AppError::not_found)?;
        let record = row.into_record()?;
        debug!(target: "app::crm", contact_id = %record.id, "contact fetched");
        Ok(record)
    }

    /// Newest first. `status` must be one of the contact statuses when present.
    pub fn list_contacts(&self, status: Option<&str>) -> AppResult<Vec<ContactRecord>> {
        let status = status
            .map(|raw| ContactStatus::try_from(raw.trim()).map_err(AppError::validation))
            .transpose()?;
        let rows = self
            .db
            .with_connection(|conn| ContactRepository::list(conn, status))?;
        let contacts = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;
        debug!(target: "app::crm", count = contacts.len(), "contacts listed");
        Ok(contacts)
    }

    /// Records an interaction on behalf of `actor_id`.
    pub fn log_interaction(
        &self,
        input: InteractionCreateInput,
        actor_id: &str,
    ) -> AppResult<InteractionRecord> {
        let actor_id = actor_id.trim();
        if actor_id.is_empty() {
            return Err(AppError::validation("actor id is required"));
        }
        let interaction_type = input.interaction_type.trim();
        if interaction_type.is_empty() {
            return Err(AppError::validation("interaction type is required"));
        }
        let created_at = match input.occurred_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => normalize_timestamp(raw)?,
            _ => format_timestamp(self.clock.now()),
        };

        let record = InteractionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            contact_id: input.contact_id.trim().to_string(),
            interaction_type: interaction_type.to_string(),
            notes: normalize_optional_string(input.notes),
            created_by: actor_id.to_string(),
            created_at,
        };

        self.db.with_connection(|conn| {
            ContactRepository::find_by_id(conn, &record.contact_id)?
                .ok_or_else(AppError::not_found)?;
            InteractionRepository::insert(conn, &InteractionRow::from_record(&record))
        })?;

        info!(
            target: "app::crm",
            interaction_id = %record.id,
            contact_id = %record.contact_id,
            interaction_type = %record.interaction_type,
            actor_id = %record.created_by,
            "interaction logged"
        );
        Ok(record)
    }

    /// Newest first.
    pub fn list_interactions(
        &self,
        contact_id: &str,
        limit: Option<usize>,
    ) -> AppResult<Vec<InteractionRecord>> {
        let limit = limit
            .unwrap_or(DEFAULT_INTERACTION_PAGE)
            .clamp(1, MAX_INTERACTION_PAGE);
        let rows = self.db.with_connection(|conn| {
            ContactRepository::find_by_id(conn, contact_id)?.ok_or_else(AppError::not_found)?;
            InteractionRepository::list_recent(conn, contact_id, limit)
        })?;
        Ok(rows.into_iter().map(InteractionRow::into_record).collect())
    }
}

fn build_record_from_create(input: ContactCreateInput) -> AppResult<ContactRecord> {
    let first_name = normalize_name(&input.first_name, "first name")?;
    let last_name = normalize_name(&input.last_name, "last name")?;
    let status = match normalize_optional_string(input.status) {
        Some(raw) => ContactStatus::try_from(raw.to_lowercase().as_str())
            .map_err(AppError::validation)?,
        None => ContactStatus::Lead,
    };
    let email = normalize_optional_string(input.email);
    if let Some(email) = email.as_deref() {
        validate_email(email, "email")?;
    }

    Ok(ContactRecord {
        id: String::new(),
        client_code: normalize_optional_string(input.client_code).unwrap_or_default(),
        first_name,
        last_name,
        status,
        email,
        phone: normalize_optional_string(input.phone),
        assigned_to: normalize_optional_string(input.assigned_to),
        created_at: String::new(),
        updated_at: String::new(),
    })
}

fn normalize_name(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_email(email: &str, field: &str) -> AppResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation_with_details(
            "email address is malformed",
            serde_json::json!({ "field": field }),
        )),
    }
}

pub(crate) fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn generate_client_code() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{CLIENT_CODE_PREFIX}{}", raw[..8].to_uppercase())
}
