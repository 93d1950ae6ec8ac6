pub mod crm;
pub mod engagement;
pub mod suggestions;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::error;

use crate::config::CrmConfig;
use crate::db::DbPool;
use crate::error::AppError;
use crate::services::contact_service::ContactService;
use crate::services::contract_service::ContractService;
use crate::services::dashboard_service::DashboardService;
use crate::services::email_service::EmailService;
use crate::services::engagement_service::EngagementService;
use crate::services::notification_service::NotificationService;
use crate::services::product_service::ProductService;
use crate::services::suggestion_service::SuggestionService;
use crate::utils::clock::SharedClock;

#[derive(Clone)]
pub struct AppState {
    contact_service: Arc<ContactService>,
    contract_service: Arc<ContractService>,
    email_service: Arc<EmailService>,
    product_service: Arc<ProductService>,
    engagement_service: Arc<EngagementService>,
    suggestion_service: Arc<SuggestionService>,
    notification_service: Arc<NotificationService>,
    dashboard_service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(db_pool: DbPool, config: &CrmConfig, clock: SharedClock) -> Self {
        let contact_service = Arc::new(ContactService::new(db_pool.clone(), Arc::clone(&clock)));
        let contract_service = Arc::new(ContractService::new(db_pool.clone(), Arc::clone(&clock)));
        let email_service = Arc::new(EmailService::new(db_pool.clone(), Arc::clone(&clock)));
        let product_service = Arc::new(ProductService::new(db_pool.clone(), Arc::clone(&clock)));
        let engagement_service = Arc::new(EngagementService::new(
            db_pool.clone(),
            Arc::clone(&clock),
            config,
        ));
        let suggestion_service = Arc::new(SuggestionService::new(
            db_pool.clone(),
            Arc::clone(&clock),
            config,
        ));
        let notification_service = Arc::new(NotificationService::new(db_pool.clone()));
        let dashboard_service = Arc::new(DashboardService::new(db_pool));

        Self {
            contact_service,
            contract_service,
            email_service,
            product_service,
            engagement_service,
            suggestion_service,
            notification_service,
            dashboard_service,
        }
    }

    pub fn contacts(&self) -> Arc<ContactService> {
        Arc::clone(&self.contact_service)
    }

    pub fn contracts(&self) -> Arc<ContractService> {
        Arc::clone(&self.contract_service)
    }

    pub fn emails(&self) -> Arc<EmailService> {
        Arc::clone(&self.email_service)
    }

    pub fn products(&self) -> Arc<ProductService> {
        Arc::clone(&self.product_service)
    }

    pub fn engagement(&self) -> Arc<EngagementService> {
        Arc::clone(&self.engagement_service)
    }

    pub fn suggestions(&self) -> Arc<SuggestionService> {
        Arc::clone(&self.suggestion_service)
    }

    pub fn notifications(&self) -> Arc<NotificationService> {
        Arc::clone(&self.notification_service)
    }

    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard_service)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    /// HTTP status a transport adapter should answer with.
    pub fn http_status(&self) -> u16 {
        match self.code.as_str() {
            "VALIDATION_ERROR" => 400,
            "NOT_FOUND" => 404,
            "CONFLICT" => 409,
            _ => 500,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => CommandError::new("NOT_FOUND", "requested resource does not exist", None),
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Persistence { message } => {
                error!(target: "app::command", %message, "persistence error in command");
                CommandError::new("PERSISTENCE_ERROR", message, None)
            }
            AppError::Config(message) => {
                error!(target: "app::command", %message, "configuration error in command");
                CommandError::new("CONFIG_ERROR", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "serialization failed", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "file system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

/// Moves blocking database work off the async executor.
pub(crate) async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("task execution failed: {err}"), None))?
        .map_err(CommandError::from)
}

/// Trimmed value of a mandatory request field, or a `VALIDATION_ERROR`
/// naming the field.
pub(crate) fn require_field(value: &str, field: &str) -> CommandResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation_with_details(
            format!("{field} is required"),
            serde_json::json!({ "field": field }),
        )
        .into());
    }
    Ok(trimmed.to_string())
}
