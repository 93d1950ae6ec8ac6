use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use courtier_crm_lib::config::CrmConfig;
use courtier_crm_lib::db::DbPool;
use courtier_crm_lib::error::AppError;
use courtier_crm_lib::models::contact::{ContactCreateInput, ContactRecord};
use courtier_crm_lib::models::interaction::InteractionCreateInput;
use courtier_crm_lib::services::contact_service::ContactService;
use courtier_crm_lib::services::engagement_service::EngagementService;
use courtier_crm_lib::utils::clock::{FixedClock, SharedClock};
use courtier_crm_lib::utils::time::format_timestamp;
use tempfile::tempdir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 20, 9, 0, 0).unwrap()
}

struct Fixture {
    pool: DbPool,
    contacts: ContactService,
    engagement: EngagementService,
    _dir: tempfile::TempDir,
}

fn setup() -> Fixture {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("engagement.sqlite")).expect("db pool");
    let clock: SharedClock = Arc::new(FixedClock::new(now()));
    let config = CrmConfig::default();
    Fixture {
        contacts: ContactService::new(pool.clone(), Arc::clone(&clock)),
        engagement: EngagementService::new(pool.clone(), clock, &config),
        pool,
        _dir: dir,
    }
}

fn create_contact(
    fixture: &Fixture,
    status: &str,
    email: Option<&str>,
    phone: Option<&str>,
) -> ContactRecord {
    fixture
        .contacts
        .create_contact(ContactCreateInput {
            first_name: "Claire".into(),
            last_name: "Dubois".into(),
            status: Some(status.into()),
            email: email.map(Into::into),
            phone: phone.map(Into::into),
            ..Default::default()
        })
        .expect("create contact")
}

fn log_days_ago(fixture: &Fixture, contact_id: &str, days: i64) {
    fixture
        .contacts
        .log_interaction(
            InteractionCreateInput {
                contact_id: contact_id.into(),
                interaction_type: "call".into(),
                notes: None,
                occurred_at: Some(format_timestamp(now() - Duration::days(days))),
            },
            "agent-1",
        )
        .expect("log interaction");
}

fn score_rows(fixture: &Fixture, contact_id: &str) -> i64 {
    fixture
        .pool
        .with_connection(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM ai_engagement_scores WHERE contact_id = ?",
                [contact_id],
                |row| row.get(0),
            )?)
        })
        .expect("count scores")
}

#[tokio::test]
async fn scenario_active_client_is_clamped_to_one_hundred() {
    let fixture = setup();
    let contact = create_contact(&fixture, "client", Some("claire@example.fr"), None);
    for days in [3, 10, 20, 40, 60, 90] {
        log_days_ago(&fixture, &contact.id, days);
    }

    let result = fixture.engagement.compute_score(&contact.id).expect("score");
    assert_eq!(result.score, 100);
    assert_eq!(result.confidence, 0.85);

    let stored = fixture.engagement.get_score(&contact.id).expect("stored");
    assert_eq!(stored.score, 100);
    assert_eq!(stored.factors.interactions_count, 6);
    assert_eq!(stored.factors.last_interaction_days, Some(3));
    assert!(stored.factors.has_email);
    assert!(!stored.factors.has_phone);
    assert_eq!(stored.calculated_at, "2026-05-20T09:00:00Z");
}

#[tokio::test]
async fn scenario_bare_lead_scores_fifty() {
    let fixture = setup();
    let contact = create_contact(&fixture, "lead", None, None);

    let result = fixture.engagement.compute_score(&contact.id).expect("score");
    assert_eq!(result.score, 50);

    let stored = fixture.engagement.get_score(&contact.id).expect("stored");
    assert_eq!(stored.factors.interactions_count, 0);
    assert_eq!(stored.factors.last_interaction_days, None);
}

#[tokio::test]
async fn scenario_dormant_prospect_scores_fifty_five() {
    let fixture = setup();
    let contact = create_contact(&fixture, "prospect", None, None);
    log_days_ago(&fixture, &contact.id, 45);

    let result = fixture.engagement.compute_score(&contact.id).expect("score");
    assert_eq!(result.score, 55);
}

#[tokio::test]
async fn recompute_overwrites_the_single_score_row() {
    let fixture = setup();
    let contact = create_contact(&fixture, "prospect", Some("p@example.fr"), None);

    let first = fixture.engagement.compute_score(&contact.id).expect("first");
    let again = fixture.engagement.compute_score(&contact.id).expect("again");
    assert_eq!(first, again);
    assert_eq!(score_rows(&fixture, &contact.id), 1);

    log_days_ago(&fixture, &contact.id, 1);
    let updated = fixture.engagement.compute_score(&contact.id).expect("updated");
    assert_eq!(updated.score, first.score + 20);
    assert_eq!(score_rows(&fixture, &contact.id), 1);
    assert_eq!(
        fixture.engagement.get_score(&contact.id).unwrap().score,
        updated.score
    );
}

#[tokio::test]
async fn only_the_newest_ten_interactions_are_sampled() {
    let fixture = setup();
    let contact = create_contact(&fixture, "lead", None, None);
    for days in 0..12 {
        log_days_ago(&fixture, &contact.id, days);
    }

    fixture.engagement.compute_score(&contact.id).expect("score");
    let stored = fixture.engagement.get_score(&contact.id).expect("stored");
    assert_eq!(stored.factors.interactions_count, 10);
    assert_eq!(stored.factors.last_interaction_days, Some(0));
}

#[tokio::test]
async fn unknown_contact_fails_before_any_write() {
    let fixture = setup();

    let result = fixture.engagement.compute_score("does-not-exist");
    assert!(matches!(result, Err(AppError::NotFound)));

    let total: i64 = fixture
        .pool
        .with_connection(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM ai_engagement_scores", [], |row| {
                row.get(0)
            })?)
        })
        .unwrap();
    assert_eq!(total, 0);
    assert!(matches!(
        fixture.engagement.get_score("does-not-exist"),
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn concurrent_recomputes_leave_one_row() {
    let fixture = setup();
    let contact = create_contact(&fixture, "client", None, Some("0612345678"));
    let engagement = Arc::new(fixture.engagement);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engagement = Arc::clone(&engagement);
            let contact_id = contact.id.clone();
            tokio::task::spawn_blocking(move || engagement.compute_score(&contact_id))
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        let score = result.expect("join").expect("score");
        assert_eq!(score.score, 80);
    }

    let rows: i64 = fixture
        .pool
        .with_connection(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM ai_engagement_scores", [], |row| {
                row.get(0)
            })?)
        })
        .unwrap();
    assert_eq!(rows, 1);
}
