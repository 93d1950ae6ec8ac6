// Failure paths: persistence errors, rollback and validation

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use courtier_crm_lib::config::CrmConfig;
use courtier_crm_lib::db::DbPool;
use courtier_crm_lib::error::AppError;
use courtier_crm_lib::models::contact::ContactCreateInput;
use courtier_crm_lib::models::notification::NotificationFilter;
use courtier_crm_lib::models::suggestion::ReviewDecision;
use courtier_crm_lib::services::contact_service::ContactService;
use courtier_crm_lib::services::engagement_service::EngagementService;
use courtier_crm_lib::services::notification_service::NotificationService;
use courtier_crm_lib::services::suggestion_service::SuggestionService;
use courtier_crm_lib::utils::clock::{FixedClock, SharedClock};
use tempfile::tempdir;

struct Env {
    pool: DbPool,
    contacts: ContactService,
    engagement: EngagementService,
    suggestions: SuggestionService,
    notifications: NotificationService,
    _dir: tempfile::TempDir,
}

fn setup_test_environment() -> Env {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("errors.sqlite")).expect("db pool");
    let clock: SharedClock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap(),
    ));
    let config = CrmConfig::default();
    Env {
        contacts: ContactService::new(pool.clone(), Arc::clone(&clock)),
        engagement: EngagementService::new(pool.clone(), Arc::clone(&clock), &config),
        suggestions: SuggestionService::new(pool.clone(), clock, &config),
        notifications: NotificationService::new(pool.clone()),
        pool,
        _dir: dir,
    }
}

fn prospect(env: &Env) -> String {
    env.contacts
        .create_contact(ContactCreateInput {
            first_name: "Nora".into(),
            last_name: "Petit".into(),
            status: Some("prospect".into()),
            ..Default::default()
        })
        .expect("contact")
        .id
}

fn install_abort_trigger(env: &Env, table: &str) {
    let sql = format!(
        "CREATE TRIGGER fail_{table} BEFORE INSERT ON {table} \
         BEGIN SELECT RAISE(ABORT, '{table} unavailable'); END;"
    );
    env.pool
        .with_connection(|conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .expect("install trigger");
}

fn count(env: &Env, table: &str) -> i64 {
    env.pool
        .with_connection(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        })
        .expect("count")
}

#[tokio::test]
async fn failed_score_write_is_a_persistence_error() {
    let env = setup_test_environment();
    let contact_id = prospect(&env);
    install_abort_trigger(&env, "ai_engagement_scores");

    let result = env.engagement.compute_score(&contact_id);
    assert!(matches!(result, Err(AppError::Persistence { .. })));
    assert_eq!(count(&env, "ai_engagement_scores"), 0);
}

#[tokio::test]
async fn failed_notification_rolls_back_the_whole_batch() {
    let env = setup_test_environment();
    let contact_id = prospect(&env);
    install_abort_trigger(&env, "notifications");

    let result = env.suggestions.generate(&contact_id, "collab-1");
    assert!(matches!(result, Err(AppError::Persistence { .. })));
    assert_eq!(count(&env, "ai_suggestions"), 0);
    assert!(env
        .notifications
        .list_for_collaborator("collab-1", NotificationFilter::All)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn failed_suggestion_insert_writes_nothing() {
    let env = setup_test_environment();
    let contact_id = prospect(&env);
    install_abort_trigger(&env, "ai_suggestions");

    let result = env.suggestions.generate(&contact_id, "collab-1");
    assert!(result.unwrap_err().is_persistence());
    assert_eq!(count(&env, "ai_suggestions"), 0);
    assert_eq!(count(&env, "notifications"), 0);
}

#[tokio::test]
async fn blank_actor_is_rejected_before_any_write() {
    let env = setup_test_environment();
    let contact_id = prospect(&env);

    assert!(matches!(
        env.suggestions.generate(&contact_id, "  "),
        Err(AppError::Validation { .. })
    ));
    assert_eq!(count(&env, "ai_suggestions"), 0);

    let generated = env.suggestions.generate(&contact_id, "collab-1").unwrap();
    assert!(matches!(
        env.suggestions.review(&generated[0].id, ReviewDecision::Accepted, ""),
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn mark_read_of_unknown_notification_is_not_found() {
    let env = setup_test_environment();
    assert!(matches!(
        env.notifications.mark_read("missing"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn invalid_configuration_is_reported() {
    let err = CrmConfig::from_yaml("engagement:\n  interaction_sample_limit: 0\n").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));

    let err = CrmConfig::from_yaml("confidence: [1, 2]").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));

    // would overflow the cutoff timestamp during generation
    let err = CrmConfig::from_yaml("suggestions:\n  recent_window_days: 1000000000\n").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}
