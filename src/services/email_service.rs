use tracing::{debug, info};

use crate::db::repositories::contact_repository::ContactRepository;
use crate::db::repositories::email_repository::{EmailRepository, EmailRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::email::{EmailCreateInput, EmailDirection, EmailListParams, EmailPage, EmailRecord};
use crate::services::contact_service::{normalize_optional_string, validate_email};
use crate::utils::clock::SharedClock;
use crate::utils::pagination::PageRequest;
use crate::utils::redact::mask_email;
use crate::utils::time::{format_timestamp, normalize_timestamp};

const MAX_SUBJECT_LENGTH: usize = 255;

/// Email log. Records exchanges with contacts; delivery happens elsewhere.
pub struct EmailService {
    db: DbPool,
    clock: SharedClock,
}

impl EmailService {
    pub fn new(db: DbPool, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    /// Logs an email on behalf of `actor_id`. A linked contact must exist.
    pub fn log_email(&self, input: EmailCreateInput, actor_id: &str) -> AppResult<EmailRecord> {
        let actor_id = actor_id.trim();
        if actor_id.is_empty() {
            return Err(AppError::validation("actor id is required"));
        }
        let mut record = build_record_from_create(input)?;
        record.id = uuid::Uuid::new_v4().to_string();
        record.collaborator_id = actor_id.to_string();
        if record.created_at.is_empty() {
            record.created_at = format_timestamp(self.clock.now());
        }

        self.db.with_connection(|conn| {
            if let Some(contact_id) = record.contact_id.as_deref() {
                ContactRepository::find_by_id(conn, contact_id)?.ok_or_else(AppError::not_found)?;
            }
            EmailRepository::insert(conn, &EmailRow::from_record(&record))
        })?;

        info!(
            target: "app::crm",
            email_id = %record.id,
            email_type = %record.email_type,
            to = %mask_email(&record.to_email),
            actor_id = %record.collaborator_id,
            "email logged"
        );
        Ok(record)
    }

    /// One page of logged emails, newest first.
    pub fn list_emails(&self, params: EmailListParams) -> AppResult<EmailPage> {
        let request = PageRequest::new(params.page, params.limit)?;
        let direction = params.filter.direction();
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());

        let (rows, total) = self.db.with_connection(|conn| {
            let rows = EmailRepository::search_page(
                conn,
                direction,
                search,
                request.limit,
                request.offset(),
            )?;
            let total = EmailRepository::count_matching(conn, direction, search)?;
            Ok((rows, total))
        })?;

        let data = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;
        debug!(
            target: "app::crm",
            filter = ?params.filter,
            returned = data.len(),
            total,
            "emails listed"
        );

        Ok(EmailPage {
            data,
            pagination: request.describe(total),
        })
    }
}

fn build_record_from_create(input: EmailCreateInput) -> AppResult<EmailRecord> {
    let from_email = input.from_email.trim().to_string();
    validate_email(&from_email, "fromEmail")?;
    let to_email = input.to_email.trim().to_string();
    validate_email(&to_email, "toEmail")?;

    let subject = input.subject.trim();
    if subject.is_empty() {
        return Err(AppError::validation("subject is required"));
    }
    if subject.chars().count() > MAX_SUBJECT_LENGTH {
        return Err(AppError::validation(format!(
            "subject must be at most {MAX_SUBJECT_LENGTH} characters"
        )));
    }

    let email_type = match normalize_optional_string(input.email_type) {
        Some(raw) => EmailDirection::try_from(raw.to_lowercase().as_str())
            .map_err(AppError::validation)?,
        None => EmailDirection::Outbound,
    };
    let created_at = match normalize_optional_string(input.sent_at) {
        Some(raw) => normalize_timestamp(&raw)?,
        None => String::new(),
    };

    Ok(EmailRecord {
        id: String::new(),
        contact_id: normalize_optional_string(input.contact_id),
        collaborator_id: String::new(),
        from_email,
        to_email,
        subject: subject.to_string(),
        body: normalize_optional_string(input.body),
        email_type,
        created_at,
    })
}
