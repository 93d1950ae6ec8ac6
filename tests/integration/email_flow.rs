// Email log: direction filter, search and ordering

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use courtier_crm_lib::db::DbPool;
use courtier_crm_lib::error::AppError;
use courtier_crm_lib::models::contact::ContactCreateInput;
use courtier_crm_lib::models::email::{EmailCreateInput, EmailFilter, EmailListParams};
use courtier_crm_lib::services::contact_service::ContactService;
use courtier_crm_lib::services::email_service::EmailService;
use courtier_crm_lib::utils::clock::{FixedClock, SharedClock};
use courtier_crm_lib::utils::pagination::PageRequest;
use tempfile::tempdir;

const ACTOR: &str = "collab-3";
const OFFICE: &str = "contact@cabinet-durand.fr";

struct Fixture {
    pool: DbPool,
    contacts: ContactService,
    emails: EmailService,
    _dir: tempfile::TempDir,
}

fn setup() -> Fixture {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("emails.sqlite")).expect("db pool");
    let clock: SharedClock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
    ));
    Fixture {
        contacts: ContactService::new(pool.clone(), Arc::clone(&clock)),
        emails: EmailService::new(pool.clone(), clock),
        pool,
        _dir: dir,
    }
}

fn email(kind: &str, from: &str, to: &str, subject: &str, sent_at: &str) -> EmailCreateInput {
    EmailCreateInput {
        from_email: from.into(),
        to_email: to.into(),
        subject: subject.into(),
        email_type: Some(kind.into()),
        sent_at: Some(sent_at.into()),
        ..Default::default()
    }
}

/// Three outbound and two inbound emails, one per day in September.
fn seed_mailbox(fixture: &Fixture) {
    let mailbox = [
        ("outbound", OFFICE, "marie.lopez@example.fr", "Devis assurance habitation", "2026-09-01T10:00:00Z"),
        ("inbound", "marie.lopez@example.fr", OFFICE, "RE: Devis assurance habitation", "2026-09-02T10:00:00Z"),
        ("outbound", OFFICE, "jean.morel@example.fr", "Renouvellement contrat auto", "2026-09-03T10:00:00Z"),
        ("inbound", "sinistres@assureur.fr", OFFICE, "Dossier 100%_garanti", "2026-09-04T10:00:00Z"),
        ("outbound", OFFICE, "jean.morel@example.fr", "Relance signature", "2026-09-05T10:00:00Z"),
    ];
    for (kind, from, to, subject, at) in mailbox {
        fixture
            .emails
            .log_email(email(kind, from, to, subject, at), ACTOR)
            .expect("log email");
    }
}

fn subjects(fixture: &Fixture, params: EmailListParams) -> Vec<String> {
    fixture
        .emails
        .list_emails(params)
        .expect("list emails")
        .data
        .into_iter()
        .map(|e| e.subject)
        .collect()
}

#[tokio::test]
async fn all_filter_lists_newest_first() {
    let fixture = setup();
    seed_mailbox(&fixture);

    assert_eq!(
        subjects(&fixture, EmailListParams::default()),
        vec![
            "Relance signature",
            "Dossier 100%_garanti",
            "Renouvellement contrat auto",
            "RE: Devis assurance habitation",
            "Devis assurance habitation",
        ]
    );
}

#[tokio::test]
async fn sent_and_received_filters_split_by_direction() {
    let fixture = setup();
    seed_mailbox(&fixture);

    let sent = fixture
        .emails
        .list_emails(EmailListParams {
            filter: EmailFilter::Sent,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(sent.pagination.total, 3);
    assert!(sent.data.iter().all(|e| e.from_email == OFFICE));

    assert_eq!(
        subjects(
            &fixture,
            EmailListParams {
                filter: EmailFilter::Received,
                ..Default::default()
            }
        ),
        vec!["Dossier 100%_garanti", "RE: Devis assurance habitation"]
    );
}

#[tokio::test]
async fn search_matches_subject_sender_and_recipient_case_insensitively() {
    let fixture = setup();
    seed_mailbox(&fixture);

    let search = |term: &str, filter: EmailFilter| {
        subjects(
            &fixture,
            EmailListParams {
                filter,
                search: Some(term.into()),
                ..Default::default()
            },
        )
    };

    // subject
    assert_eq!(
        search("DEVIS", EmailFilter::All),
        vec!["RE: Devis assurance habitation", "Devis assurance habitation"]
    );
    // recipient
    assert_eq!(
        search("jean.morel", EmailFilter::All),
        vec!["Relance signature", "Renouvellement contrat auto"]
    );
    // sender, combined with the direction filter
    assert_eq!(
        search("Marie.Lopez", EmailFilter::Received),
        vec!["RE: Devis assurance habitation"]
    );
    assert!(search("nobody@nowhere", EmailFilter::All).is_empty());
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let fixture = setup();
    seed_mailbox(&fixture);

    let listed = |term: &str| {
        subjects(
            &fixture,
            EmailListParams {
                search: Some(term.into()),
                ..Default::default()
            },
        )
    };
    assert_eq!(listed("100%_"), vec!["Dossier 100%_garanti"]);
    assert!(listed("devis_assurance").is_empty());
    // a blank term is no filter at all
    assert_eq!(listed("   ").len(), 5);
}

#[tokio::test]
async fn pages_follow_the_shared_page_request() {
    let fixture = setup();
    seed_mailbox(&fixture);

    let page = fixture
        .emails
        .list_emails(EmailListParams {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        })
        .unwrap();
    let expected = PageRequest::new(Some(2), Some(2)).unwrap().describe(5);
    assert_eq!(page.pagination, expected);
    assert_eq!(page.pagination.total_pages, 3);
    let subjects: Vec<_> = page.data.iter().map(|e| e.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Renouvellement contrat auto", "RE: Devis assurance habitation"]);

    assert!(matches!(
        fixture.emails.list_emails(EmailListParams {
            limit: Some(1000),
            ..Default::default()
        }),
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn emails_outlive_a_deleted_contact() {
    let fixture = setup();
    let contact = fixture
        .contacts
        .create_contact(ContactCreateInput {
            first_name: "Marie".into(),
            last_name: "Lopez".into(),
            email: Some("marie.lopez@example.fr".into()),
            ..Default::default()
        })
        .expect("contact");

    let mut input = email(
        "outbound",
        OFFICE,
        "marie.lopez@example.fr",
        "Bienvenue",
        "2026-09-10T08:00:00Z",
    );
    input.contact_id = Some(contact.id.clone());
    let logged = fixture.emails.log_email(input, ACTOR).expect("log email");
    assert_eq!(logged.contact_id.as_deref(), Some(contact.id.as_str()));

    fixture
        .pool
        .with_connection(|conn| {
            conn.execute("DELETE FROM contacts WHERE id = ?1", [&contact.id])?;
            Ok(())
        })
        .expect("delete contact");

    let page = fixture.emails.list_emails(EmailListParams::default()).unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].contact_id, None);
    assert_eq!(page.data[0].collaborator_id, ACTOR);
}
