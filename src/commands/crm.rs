use serde::Deserialize;

use crate::models::contact::{ContactCreateInput, ContactRecord};
use crate::models::contract::{
    ContractCreateInput, ContractListParams, ContractPage, ContractRecord, ContractUpdateInput,
};
use crate::models::email::{EmailCreateInput, EmailListParams, EmailPage, EmailRecord};
use crate::models::interaction::{InteractionCreateInput, InteractionRecord};
use crate::models::notification::{NotificationFilter, NotificationRecord};
use crate::models::product::{ProductCreateInput, ProductListParams, ProductPage, ProductRecord};
use crate::models::stats::DashboardStats;

use super::engagement::ContactRequest;
use super::{require_field, run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactListFilters {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionListRequest {
    pub contact_id: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationListRequest {
    pub collaborator_id: String,
    pub filter: NotificationFilter,
}

pub async fn contacts_create(
    state: &AppState,
    payload: ContactCreateInput,
) -> CommandResult<ContactRecord> {
    require_field(&payload.first_name, "firstName")?;
    require_field(&payload.last_name, "lastName")?;
    let service = state.contacts();
    run_blocking(move || service.create_contact(payload)).await
}

pub async fn contacts_get(state: &AppState, request: ContactRequest) -> CommandResult<ContactRecord> {
    let contact_id = require_field(&request.contact_id, "contactId")?;
    let service = state.contacts();
    run_blocking(move || service.get_contact(&contact_id)).await
}

pub async fn contacts_list(
    state: &AppState,
    filters: Option<ContactListFilters>,
) -> CommandResult<Vec<ContactRecord>> {
    let filters = filters.unwrap_or_default();
    let service = state.contacts();
    run_blocking(move || service.list_contacts(filters.status.as_deref())).await
}

pub async fn interactions_log(
    state: &AppState,
    payload: InteractionCreateInput,
    actor_id: String,
) -> CommandResult<InteractionRecord> {
    require_field(&payload.contact_id, "contactId")?;
    require_field(&payload.interaction_type, "interactionType")?;
    let actor_id = require_field(&actor_id, "actorId")?;
    let service = state.contacts();
    run_blocking(move || service.log_interaction(payload, &actor_id)).await
}

pub async fn interactions_list(
    state: &AppState,
    request: InteractionListRequest,
) -> CommandResult<Vec<InteractionRecord>> {
    let contact_id = require_field(&request.contact_id, "contactId")?;
    let service = state.contacts();
    run_blocking(move || service.list_interactions(&contact_id, request.limit)).await
}

pub async fn contracts_create(
    state: &AppState,
    payload: ContractCreateInput,
) -> CommandResult<ContractRecord> {
    require_field(&payload.contact_id, "contactId")?;
    require_field(&payload.contract_number, "contractNumber")?;
    require_field(&payload.product_name, "productName")?;
    let service = state.contracts();
    run_blocking(move || service.create_contract(payload)).await
}

pub async fn contracts_get(state: &AppState, id: String) -> CommandResult<ContractRecord> {
    let id = require_field(&id, "id")?;
    let service = state.contracts();
    run_blocking(move || service.get_contract(&id)).await
}

pub async fn contracts_update(
    state: &AppState,
    id: String,
    payload: ContractUpdateInput,
) -> CommandResult<ContractRecord> {
    let id = require_field(&id, "id")?;
    let service = state.contracts();
    run_blocking(move || service.update_contract(&id, payload)).await
}

pub async fn contracts_delete(state: &AppState, id: String) -> CommandResult<()> {
    let id = require_field(&id, "id")?;
    let service = state.contracts();
    run_blocking(move || service.delete_contract(&id)).await
}

pub async fn contracts_list(
    state: &AppState,
    params: Option<ContractListParams>,
) -> CommandResult<ContractPage> {
    let params = params.unwrap_or_default();
    let service = state.contracts();
    run_blocking(move || service.list_contracts(params)).await
}

pub async fn emails_log(
    state: &AppState,
    payload: EmailCreateInput,
    actor_id: String,
) -> CommandResult<EmailRecord> {
    require_field(&payload.from_email, "fromEmail")?;
    require_field(&payload.to_email, "toEmail")?;
    require_field(&payload.subject, "subject")?;
    let actor_id = require_field(&actor_id, "actorId")?;
    let service = state.emails();
    run_blocking(move || service.log_email(payload, &actor_id)).await
}

pub async fn emails_list(
    state: &AppState,
    params: Option<EmailListParams>,
) -> CommandResult<EmailPage> {
    let params = params.unwrap_or_default();
    let service = state.emails();
    run_blocking(move || service.list_emails(params)).await
}

pub async fn products_create(
    state: &AppState,
    payload: ProductCreateInput,
) -> CommandResult<ProductRecord> {
    require_field(&payload.code, "code")?;
    require_field(&payload.name, "name")?;
    require_field(&payload.category, "category")?;
    let service = state.products();
    run_blocking(move || service.create_product(payload)).await
}

pub async fn products_list(
    state: &AppState,
    params: Option<ProductListParams>,
) -> CommandResult<ProductPage> {
    let params = params.unwrap_or_default();
    let service = state.products();
    run_blocking(move || service.list_products(params)).await
}

pub async fn notifications_list(
    state: &AppState,
    request: NotificationListRequest,
) -> CommandResult<Vec<NotificationRecord>> {
    let collaborator_id = require_field(&request.collaborator_id, "collaboratorId")?;
    let filter = request.filter;
    let service = state.notifications();
    run_blocking(move || service.list_for_collaborator(&collaborator_id, filter)).await
}

pub async fn notifications_mark_read(state: &AppState, id: String) -> CommandResult<()> {
    let id = require_field(&id, "id")?;
    let service = state.notifications();
    run_blocking(move || service.mark_read(&id)).await
}

pub async fn dashboard_stats(state: &AppState) -> CommandResult<DashboardStats> {
    let service = state.dashboard();
    run_blocking(move || service.stats()).await
}
