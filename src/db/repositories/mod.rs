pub mod contact_repository;
pub mod contract_repository;
pub mod email_repository;
pub mod engagement_repository;
pub mod interaction_repository;
pub mod notification_repository;
pub mod product_repository;
pub mod suggestion_repository;

/// `%term%` with LIKE wildcards in `search` escaped; pair with `ESCAPE '\'`.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
