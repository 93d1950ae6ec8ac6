use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use courtier_crm_lib::config::CrmConfig;
use courtier_crm_lib::db::DbPool;
use courtier_crm_lib::error::AppError;
use courtier_crm_lib::models::contact::{ContactCreateInput, ContactRecord};
use courtier_crm_lib::models::contract::{ContractCreateInput, ContractListParams};
use courtier_crm_lib::models::interaction::InteractionCreateInput;
use courtier_crm_lib::models::notification::NotificationFilter;
use courtier_crm_lib::models::suggestion::{
    ReviewDecision, SuggestionPriority, SuggestionStatus, SuggestionType,
};
use courtier_crm_lib::services::contact_service::ContactService;
use courtier_crm_lib::services::contract_service::ContractService;
use courtier_crm_lib::services::engagement_service::EngagementService;
use courtier_crm_lib::services::notification_service::NotificationService;
use courtier_crm_lib::services::suggestion_service::{
    SuggestionService, SUGGESTIONS_NOTIFICATION_TYPE,
};
use courtier_crm_lib::utils::clock::{FixedClock, SharedClock};
use courtier_crm_lib::utils::time::format_timestamp;
use tempfile::tempdir;

const ACTOR: &str = "collab-42";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 14, 0, 0).unwrap()
}

struct Fixture {
    pool: DbPool,
    contacts: ContactService,
    contracts: ContractService,
    engagement: EngagementService,
    suggestions: SuggestionService,
    notifications: NotificationService,
    _dir: tempfile::TempDir,
}

fn setup() -> Fixture {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("suggestions.sqlite")).expect("db pool");
    let clock: SharedClock = Arc::new(FixedClock::new(now()));
    let config = CrmConfig::default();
    Fixture {
        contacts: ContactService::new(pool.clone(), Arc::clone(&clock)),
        contracts: ContractService::new(pool.clone(), Arc::clone(&clock)),
        engagement: EngagementService::new(pool.clone(), Arc::clone(&clock), &config),
        suggestions: SuggestionService::new(pool.clone(), clock, &config),
        notifications: NotificationService::new(pool.clone()),
        pool,
        _dir: dir,
    }
}

impl Fixture {
    fn contact(&self, status: &str) -> ContactRecord {
        self.contacts
            .create_contact(ContactCreateInput {
                first_name: "Hugo".into(),
                last_name: "Bernard".into(),
                status: Some(status.into()),
                ..Default::default()
            })
            .expect("create contact")
    }

    fn interaction(&self, contact_id: &str, age: Duration) {
        self.contacts
            .log_interaction(
                InteractionCreateInput {
                    contact_id: contact_id.into(),
                    interaction_type: "meeting".into(),
                    notes: None,
                    occurred_at: Some(format_timestamp(now() - age)),
                },
                ACTOR,
            )
            .expect("log interaction");
    }

    fn contracts_for(&self, contact_id: &str, count: usize) {
        for i in 0..count {
            self.contracts
                .create_contract(ContractCreateInput {
                    contact_id: contact_id.into(),
                    contract_number: format!("{contact_id}-{i}"),
                    product_name: "Multirisque habitation".into(),
                    status: Some("active".into()),
                    monthly_premium: 25.0,
                    annual_premium: 300.0,
                    received_commission: 30.0,
                    ..Default::default()
                })
                .expect("create contract");
        }
    }

    fn kinds(&self, contact_id: &str) -> Vec<SuggestionType> {
        self.suggestions
            .generate(contact_id, ACTOR)
            .expect("generate")
            .into_iter()
            .map(|s| s.suggestion_type)
            .collect()
    }

    fn suggestion_rows(&self) -> i64 {
        self.pool
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM ai_suggestions", [], |row| row.get(0))?)
            })
            .expect("count suggestions")
    }
}

#[tokio::test]
async fn scenario_dormant_prospect_gets_follow_up_and_action() {
    let fixture = setup();
    let contact = fixture.contact("prospect");
    fixture.contracts_for(&contact.id, 1);
    fixture.interaction(&contact.id, Duration::days(45));

    let score = fixture.engagement.compute_score(&contact.id).expect("score");
    assert_eq!(score.score, 55);

    let generated = fixture.suggestions.generate(&contact.id, ACTOR).expect("generate");
    let kinds: Vec<_> = generated.iter().map(|s| s.suggestion_type).collect();
    assert_eq!(kinds, vec![SuggestionType::FollowUp, SuggestionType::Action]);

    let follow_up = &generated[0];
    assert_eq!(follow_up.priority, SuggestionPriority::Medium);
    assert_eq!(follow_up.confidence_score, 0.8);
    assert_eq!(follow_up.status, SuggestionStatus::Pending);
    assert_eq!(follow_up.created_at, "2026-06-15T14:00:00Z");
    assert_eq!(generated[1].confidence_score, 0.7);

    let pending = fixture.suggestions.list_pending(&contact.id).expect("pending");
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].suggestion_type, SuggestionType::FollowUp);
}

#[tokio::test]
async fn follow_up_window_boundaries() {
    let fixture = setup();

    let never = fixture.contact("lead");
    assert_eq!(fixture.kinds(&never.id), vec![SuggestionType::FollowUp]);

    let stale = fixture.contact("lead");
    fixture.interaction(&stale.id, Duration::days(31));
    fixture.interaction(&stale.id, Duration::days(90));
    assert_eq!(fixture.kinds(&stale.id), vec![SuggestionType::FollowUp]);

    let day_thirty = fixture.contact("lead");
    fixture.interaction(&day_thirty.id, Duration::days(30));
    assert!(fixture.kinds(&day_thirty.id).is_empty());

    let recent = fixture.contact("lead");
    fixture.interaction(&recent.id, Duration::hours(2));
    assert!(fixture.kinds(&recent.id).is_empty());
}

#[tokio::test]
async fn cross_sell_fires_only_for_exactly_one_contract() {
    let fixture = setup();

    for (contracts, expect_cross_sell) in [(0, false), (1, true), (2, false)] {
        let client = fixture.contact("client");
        fixture.interaction(&client.id, Duration::days(1));
        fixture.contracts_for(&client.id, contracts);

        let generated = fixture.suggestions.generate(&client.id, ACTOR).expect("generate");
        let has_cross_sell = generated
            .iter()
            .any(|s| s.suggestion_type == SuggestionType::CrossSell);
        assert_eq!(has_cross_sell, expect_cross_sell, "{contracts} contracts");
        if expect_cross_sell {
            assert_eq!(generated[0].priority, SuggestionPriority::High);
            assert_eq!(generated[0].confidence_score, 0.75);
        }
    }
}

#[tokio::test]
async fn deleting_a_contract_changes_the_cross_sell_outcome() {
    let fixture = setup();
    let client = fixture.contact("client");
    fixture.interaction(&client.id, Duration::days(2));
    fixture.contracts_for(&client.id, 2);
    assert!(fixture.kinds(&client.id).is_empty());

    let page = fixture
        .contracts
        .list_contracts(ContractListParams {
            search: Some(client.id.clone()),
            ..Default::default()
        })
        .expect("contracts");
    assert_eq!(page.data.len(), 2);
    fixture
        .contracts
        .delete_contract(&page.data[0].id)
        .expect("delete contract");
    assert_eq!(fixture.kinds(&client.id), vec![SuggestionType::CrossSell]);

    fixture
        .contracts
        .delete_contract(&page.data[1].id)
        .expect("delete contract");
    assert!(fixture.kinds(&client.id).is_empty());
}

#[tokio::test]
async fn action_fires_iff_prospect() {
    let fixture = setup();
    for status in ["lead", "prospect", "client"] {
        let contact = fixture.contact(status);
        fixture.interaction(&contact.id, Duration::days(2));
        let kinds = fixture.kinds(&contact.id);
        assert_eq!(
            kinds.contains(&SuggestionType::Action),
            status == "prospect",
            "status {status}"
        );
    }
}

#[tokio::test]
async fn nothing_is_written_when_no_rule_fires() {
    let fixture = setup();
    let contact = fixture.contact("client");
    fixture.interaction(&contact.id, Duration::days(3));

    let generated = fixture.suggestions.generate(&contact.id, ACTOR).expect("generate");
    assert!(generated.is_empty());
    assert_eq!(fixture.suggestion_rows(), 0);
    assert!(fixture
        .notifications
        .list_for_collaborator(ACTOR, NotificationFilter::All)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn generation_notifies_the_acting_collaborator() {
    let fixture = setup();
    let contact = fixture.contact("prospect");

    fixture.suggestions.generate(&contact.id, ACTOR).expect("generate");

    let inbox = fixture
        .notifications
        .list_for_collaborator(ACTOR, NotificationFilter::Unread)
        .expect("inbox");
    assert_eq!(inbox.len(), 1);
    let notification = &inbox[0];
    assert_eq!(notification.collaborator_id, ACTOR);
    assert_eq!(notification.notification_type, SUGGESTIONS_NOTIFICATION_TYPE);
    assert_eq!(notification.contact_id.as_deref(), Some(contact.id.as_str()));
    assert!(notification.message.starts_with("2 new suggestions"));

    assert!(fixture
        .notifications
        .list_for_collaborator("someone-else", NotificationFilter::All)
        .unwrap()
        .is_empty());

    fixture.notifications.mark_read(&notification.id).expect("mark read");
    assert!(fixture
        .notifications
        .list_for_collaborator(ACTOR, NotificationFilter::Unread)
        .unwrap()
        .is_empty());
    assert_eq!(
        fixture
            .notifications
            .list_for_collaborator(ACTOR, NotificationFilter::Read)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn generate_for_unknown_contact_writes_nothing() {
    let fixture = setup();
    let result = fixture.suggestions.generate("ghost", ACTOR);
    assert!(matches!(result, Err(AppError::NotFound)));
    assert_eq!(fixture.suggestion_rows(), 0);
    assert!(matches!(
        fixture.suggestions.list_pending("ghost"),
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn review_records_actor_and_time() {
    let fixture = setup();
    let contact = fixture.contact("prospect");
    let generated = fixture.suggestions.generate(&contact.id, ACTOR).expect("generate");

    let accepted = fixture
        .suggestions
        .review(&generated[0].id, ReviewDecision::Accepted, "reviewer-1")
        .expect("accept");
    assert_eq!(accepted.status, SuggestionStatus::Accepted);
    assert_eq!(accepted.reviewed_by.as_deref(), Some("reviewer-1"));
    assert_eq!(accepted.reviewed_at.as_deref(), Some("2026-06-15T14:00:00Z"));

    let stored = fixture.suggestions.get(&generated[0].id).expect("stored");
    assert_eq!(stored, accepted);

    let pending = fixture.suggestions.list_pending(&contact.id).expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, generated[1].id);
}

#[tokio::test]
async fn repeated_review_is_a_no_op_and_reversal_conflicts() {
    let fixture = setup();
    let contact = fixture.contact("lead");
    let generated = fixture.suggestions.generate(&contact.id, ACTOR).expect("generate");
    let id = &generated[0].id;

    let first = fixture
        .suggestions
        .review(id, ReviewDecision::Rejected, "reviewer-1")
        .expect("reject");
    let again = fixture
        .suggestions
        .review(id, ReviewDecision::Rejected, "reviewer-2")
        .expect("reject again");
    assert_eq!(again, first);
    assert_eq!(again.reviewed_by.as_deref(), Some("reviewer-1"));

    let flip = fixture.suggestions.review(id, ReviewDecision::Accepted, "reviewer-2");
    assert!(matches!(flip, Err(AppError::Conflict { .. })));
    assert_eq!(
        fixture.suggestions.get(id).unwrap().status,
        SuggestionStatus::Rejected
    );
}

#[tokio::test]
async fn review_of_missing_id_changes_nothing() {
    let fixture = setup();
    let contact = fixture.contact("prospect");
    let before = fixture.suggestions.generate(&contact.id, ACTOR).expect("generate");

    let result = fixture
        .suggestions
        .review("no-such-suggestion", ReviewDecision::Accepted, "reviewer-1");
    assert!(matches!(result, Err(AppError::NotFound)));

    let after = fixture.suggestions.list_pending(&contact.id).expect("pending");
    assert_eq!(after.len(), before.len());
    assert!(after.iter().all(|s| s.status == SuggestionStatus::Pending
        && s.reviewed_by.is_none()
        && s.reviewed_at.is_none()));
}

#[tokio::test]
async fn racing_reviews_yield_one_decision_and_conflicts() {
    let fixture = setup();
    let contact = fixture.contact("lead");
    let generated = fixture.suggestions.generate(&contact.id, ACTOR).expect("generate");
    let id = generated[0].id.clone();
    let suggestions = Arc::new(fixture.suggestions);

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let suggestions = Arc::clone(&suggestions);
            let id = id.clone();
            let decision = if i % 2 == 0 {
                ReviewDecision::Accepted
            } else {
                ReviewDecision::Rejected
            };
            tokio::task::spawn_blocking(move || {
                suggestions.review(&id, decision, &format!("reviewer-{i}"))
            })
        })
        .collect();

    let stored = {
        let mut outcomes = Vec::new();
        for result in futures::future::join_all(handles).await {
            outcomes.push(result.expect("join"));
        }
        let winner = suggestions.get(&id).expect("stored suggestion");
        for outcome in outcomes {
            match outcome {
                Ok(record) => assert_eq!(record, winner),
                Err(AppError::Conflict { .. }) => {}
                Err(other) => panic!("unexpected review error: {other:?}"),
            }
        }
        winner
    };

    assert!(stored.status.is_terminal());
    assert!(stored.reviewed_by.is_some());
}
