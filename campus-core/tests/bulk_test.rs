//! Bulk mutation engine tests: all-or-nothing semantics, cascades, audit
//! records and course access grants.

mod common;

use campus_core::{
    models::{
        AuditAction, BeginLoginRequest, BulkOutcome, BulkRequest, DraftPatch, EntityKind,
        GrantAccessRequest, LifecycleStatus, Role,
    },
    services::ServiceError,
};
use common::TestApp;
use uuid::Uuid;

fn grant_req(user_id: Uuid, course_id: Uuid, reason: &str) -> GrantAccessRequest {
    GrantAccessRequest {
        user_id,
        course_id,
        enrolled: true,
        grant_reason: Some(reason.to_string()),
    }
}

#[tokio::test]
async fn test_bulk_delete_removes_the_whole_batch() {
    let app = TestApp::spawn();
    let actor = Uuid::new_v4();
    let a = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, false)
        .await;
    let b = app
        .store
        .seed_course("Rust 201", LifecycleStatus::Draft, true)
        .await;

    let outcome = app
        .admin
        .bulk_delete(BulkRequest::new(EntityKind::Course, vec![a, b]), actor)
        .await
        .expect("bulk_delete");

    assert_eq!(
        outcome,
        BulkOutcome {
            requested: 2,
            applied: 2,
        }
    );
    assert!(app.store.course(a).await.is_none());
    assert!(app.store.course(b).await.is_none());
}

#[tokio::test]
async fn test_bulk_delete_is_all_or_nothing() {
    let app = TestApp::spawn();
    let a = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, false)
        .await;
    let b = app
        .store
        .seed_course("Rust 201", LifecycleStatus::Active, false)
        .await;
    let ghost = Uuid::new_v4();

    let result = app
        .admin
        .bulk_delete(
            BulkRequest::new(EntityKind::Course, vec![a, ghost, b]),
            Uuid::new_v4(),
        )
        .await;

    match result {
        Err(ServiceError::PartialNotFound(missing)) => assert_eq!(missing, vec![ghost]),
        other => panic!("expected PartialNotFound, got {:?}", other),
    }

    // Zero mutation happened
    assert!(app.store.course(a).await.is_some());
    assert!(app.store.course(b).await.is_some());
    assert!(app.store.audit_records().await.is_empty());
}

#[tokio::test]
async fn test_partial_not_found_reports_sorted_missing_ids() {
    let app = TestApp::spawn();
    let mut ghosts = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

    let result = app
        .admin
        .bulk_delete(
            BulkRequest::new(EntityKind::Course, ghosts.clone()),
            Uuid::new_v4(),
        )
        .await;

    ghosts.sort();
    match result {
        Err(ServiceError::PartialNotFound(missing)) => assert_eq!(missing, ghosts),
        other => panic!("expected PartialNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_request_is_rejected_before_storage() {
    let app = TestApp::spawn();

    let result = app
        .admin
        .bulk_delete(
            BulkRequest::new(EntityKind::Course, Vec::new()),
            Uuid::new_v4(),
        )
        .await;

    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_duplicate_ids_collapse() {
    let app = TestApp::spawn();
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, false)
        .await;

    let outcome = app
        .admin
        .bulk_delete(
            BulkRequest::new(EntityKind::Course, vec![course, course, course]),
            Uuid::new_v4(),
        )
        .await
        .expect("bulk_delete");

    assert_eq!(
        outcome,
        BulkOutcome {
            requested: 1,
            applied: 1,
        }
    );
}

#[tokio::test]
async fn test_deleting_users_revokes_sessions_and_clears_dependents() {
    let app = TestApp::spawn();
    let user_id = app
        .store
        .seed_user_with_two_factor("ada@campus.dev", "pw", Role::Student, "123456")
        .await
        .expect("seed");
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, true)
        .await;

    let tokens = app.sessions.issue(user_id).await.expect("session");
    app.admin
        .grant_course_access(grant_req(user_id, course, "scholarship"), Uuid::new_v4())
        .await
        .expect("grant");

    // Leave a pending login challenge behind as well
    app.auth
        .begin_login(BeginLoginRequest {
            email: "ada@campus.dev".to_string(),
            password: "pw".to_string(),
        })
        .await
        .expect("begin_login");
    assert_eq!(app.store.challenge_count().await, 1);

    app.admin
        .bulk_delete(
            BulkRequest::new(EntityKind::User, vec![user_id]),
            Uuid::new_v4(),
        )
        .await
        .expect("bulk_delete");

    // Session dead, grant gone, pending challenges gone
    let result = app.sessions.validate_access(&tokens.access_token).await;
    assert!(matches!(result, Err(ServiceError::TokenRevoked)));
    assert!(app.store.grant(user_id, course).await.is_none());
    assert_eq!(app.store.challenge_count().await, 0);
    assert!(app.store.course(course).await.is_some());
}

#[tokio::test]
async fn test_deleting_courses_clears_grants_but_not_users() {
    let app = TestApp::spawn();
    let user_id = app
        .store
        .seed_user("ada@campus.dev", "pw", Role::Student)
        .await
        .expect("seed");
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, true)
        .await;

    app.admin
        .grant_course_access(grant_req(user_id, course, "comp"), Uuid::new_v4())
        .await
        .expect("grant");

    app.admin
        .bulk_delete(
            BulkRequest::new(EntityKind::Course, vec![course]),
            Uuid::new_v4(),
        )
        .await
        .expect("bulk_delete");

    assert!(app.store.grant(user_id, course).await.is_none());

    // The user and their sessions are untouched
    app.sessions.issue(user_id).await.expect("user still live");
}

#[tokio::test]
async fn test_deleting_articles_drops_version_ledger() {
    let app = TestApp::spawn();
    let actor = Uuid::new_v4();
    let article = app
        .store
        .seed_article("ownership", LifecycleStatus::Active)
        .await;

    app.wiki
        .autosave_draft(
            article,
            "en",
            DraftPatch {
                title: Some("Ownership".to_string()),
                ..Default::default()
            },
            actor,
        )
        .await
        .expect("autosave");
    app.wiki
        .publish(article, "en", actor)
        .await
        .expect("publish");

    app.admin
        .bulk_delete(BulkRequest::new(EntityKind::WikiArticle, vec![article]), actor)
        .await
        .expect("bulk_delete");

    assert!(app.store.article(article).await.is_none());
    assert!(app.store.versions_for(article, "en").await.is_empty());
    assert!(app.store.locale(article, "en").await.is_none());
}

#[tokio::test]
async fn test_delete_writes_one_audit_record_per_id() {
    let app = TestApp::spawn();
    let actor = Uuid::new_v4();
    let a = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, false)
        .await;
    let b = app
        .store
        .seed_course("Rust 201", LifecycleStatus::Active, false)
        .await;

    app.admin
        .bulk_delete(BulkRequest::new(EntityKind::Course, vec![a, b]), actor)
        .await
        .expect("bulk_delete");

    let records = app.store.audit_records().await;
    assert_eq!(records.len(), 2);

    let mut audited: Vec<Uuid> = records.iter().map(|r| r.entity_id).collect();
    audited.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(audited, expected);

    for record in &records {
        assert_eq!(record.actor, actor);
        assert_eq!(record.entity_kind, EntityKind::Course);
        assert_eq!(record.action, AuditAction::Deleted);
    }
}

#[tokio::test]
async fn test_transition_moves_batch_and_audits_changes() {
    let app = TestApp::spawn();
    let actor = Uuid::new_v4();
    let a = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Draft, false)
        .await;
    let b = app
        .store
        .seed_course("Rust 201", LifecycleStatus::Inactive, false)
        .await;

    let outcome = app
        .admin
        .bulk_transition(
            BulkRequest::new(EntityKind::Course, vec![a, b]),
            LifecycleStatus::Active,
            actor,
        )
        .await
        .expect("bulk_transition");

    assert_eq!(
        outcome,
        BulkOutcome {
            requested: 2,
            applied: 2,
        }
    );
    assert_eq!(
        app.store.course(a).await.expect("course").status,
        LifecycleStatus::Active
    );
    assert_eq!(
        app.store.course(b).await.expect("course").status,
        LifecycleStatus::Active
    );

    let records = app.store.audit_records().await;
    assert_eq!(records.len(), 2);
    for record in &records {
        match record.action {
            AuditAction::StatusChanged { from, to } => {
                assert_ne!(from, to);
                assert_eq!(to, LifecycleStatus::Active);
            }
            other => panic!("expected StatusChanged, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_self_transition_is_an_unaudited_noop() {
    let app = TestApp::spawn();
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, false)
        .await;

    let outcome = app
        .admin
        .bulk_transition(
            BulkRequest::new(EntityKind::Course, vec![course]),
            LifecycleStatus::Active,
            Uuid::new_v4(),
        )
        .await
        .expect("bulk_transition");

    assert_eq!(
        outcome,
        BulkOutcome {
            requested: 1,
            applied: 0,
        }
    );
    assert!(app.store.audit_records().await.is_empty());
}

#[tokio::test]
async fn test_transition_is_idempotent_across_reruns() {
    let app = TestApp::spawn();
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Draft, false)
        .await;
    let req = || BulkRequest::new(EntityKind::Course, vec![course]);

    let first = app
        .admin
        .bulk_transition(req(), LifecycleStatus::Active, Uuid::new_v4())
        .await
        .expect("first run");
    let second = app
        .admin
        .bulk_transition(req(), LifecycleStatus::Active, Uuid::new_v4())
        .await
        .expect("second run");

    assert_eq!(first.applied, 1);
    assert_eq!(second.applied, 0);
    assert_eq!(app.store.audit_records().await.len(), 1);
}

#[tokio::test]
async fn test_any_distinct_transition_is_legal() {
    let app = TestApp::spawn();
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Inactive, false)
        .await;

    // Back to draft from inactive is allowed; admin authority is absolute
    app.admin
        .bulk_transition(
            BulkRequest::new(EntityKind::Course, vec![course]),
            LifecycleStatus::Draft,
            Uuid::new_v4(),
        )
        .await
        .expect("inactive to draft");

    assert_eq!(
        app.store.course(course).await.expect("course").status,
        LifecycleStatus::Draft
    );
}

#[tokio::test]
async fn test_transition_rejects_users() {
    let app = TestApp::spawn();
    let user_id = app
        .store
        .seed_user("ada@campus.dev", "pw", Role::Student)
        .await
        .expect("seed");

    let result = app
        .admin
        .bulk_transition(
            BulkRequest::new(EntityKind::User, vec![user_id]),
            LifecycleStatus::Inactive,
            Uuid::new_v4(),
        )
        .await;

    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_transition_missing_id_applies_nothing() {
    let app = TestApp::spawn();
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Draft, false)
        .await;

    let result = app
        .admin
        .bulk_transition(
            BulkRequest::new(EntityKind::Course, vec![course, Uuid::new_v4()]),
            LifecycleStatus::Active,
            Uuid::new_v4(),
        )
        .await;

    assert!(matches!(result, Err(ServiceError::PartialNotFound(_))));
    assert_eq!(
        app.store.course(course).await.expect("course").status,
        LifecycleStatus::Draft
    );
}

#[tokio::test]
async fn test_commit_failure_applies_nothing_and_is_retryable() {
    let app = TestApp::spawn();
    let actor = Uuid::new_v4();
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, false)
        .await;

    app.store.fail_next_commit();
    let result = app
        .admin
        .bulk_delete(BulkRequest::new(EntityKind::Course, vec![course]), actor)
        .await;

    assert!(matches!(result, Err(ServiceError::Storage(_))));
    assert!(app.store.course(course).await.is_some());
    assert!(app.store.audit_records().await.is_empty());

    // Nothing was applied, so the same request simply runs again
    app.admin
        .bulk_delete(BulkRequest::new(EntityKind::Course, vec![course]), actor)
        .await
        .expect("retry succeeds");
    assert!(app.store.course(course).await.is_none());
}

#[tokio::test]
async fn test_grant_course_access_upserts_per_pair() {
    let app = TestApp::spawn();
    let actor = Uuid::new_v4();
    let user_id = app
        .store
        .seed_user("ada@campus.dev", "pw", Role::Student)
        .await
        .expect("seed");
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, true)
        .await;

    app.admin
        .grant_course_access(grant_req(user_id, course, "scholarship"), actor)
        .await
        .expect("first grant");

    // Granting again replaces rather than duplicates
    app.admin
        .grant_course_access(
            GrantAccessRequest {
                user_id,
                course_id: course,
                enrolled: false,
                grant_reason: Some("support ticket 4821".to_string()),
            },
            actor,
        )
        .await
        .expect("second grant");

    let grant = app.store.grant(user_id, course).await.expect("grant row");
    assert!(!grant.enrolled);
    assert_eq!(grant.grant_reason.as_deref(), Some("support ticket 4821"));

    let records = app.store.audit_records().await;
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.action, AuditAction::AccessGranted { user_id });
        assert_eq!(record.entity_kind, EntityKind::Course);
        assert_eq!(record.entity_id, course);
    }
}

#[tokio::test]
async fn test_grant_requires_both_ends() {
    let app = TestApp::spawn();
    let user_id = app
        .store
        .seed_user("ada@campus.dev", "pw", Role::Student)
        .await
        .expect("seed");
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Active, true)
        .await;

    let no_user = app
        .admin
        .grant_course_access(grant_req(Uuid::new_v4(), course, "x"), Uuid::new_v4())
        .await;
    assert!(matches!(no_user, Err(ServiceError::UserNotFound)));

    let no_course = app
        .admin
        .grant_course_access(grant_req(user_id, Uuid::new_v4(), "x"), Uuid::new_v4())
        .await;
    assert!(matches!(no_course, Err(ServiceError::CourseNotFound)));

    assert!(app.store.audit_records().await.is_empty());
}

#[tokio::test]
async fn test_activating_a_course_creates_no_grants() {
    let app = TestApp::spawn();
    let user_id = app
        .store
        .seed_user("ada@campus.dev", "pw", Role::Student)
        .await
        .expect("seed");
    let course = app
        .store
        .seed_course("Rust 101", LifecycleStatus::Draft, true)
        .await;

    app.admin
        .bulk_transition(
            BulkRequest::new(EntityKind::Course, vec![course]),
            LifecycleStatus::Active,
            Uuid::new_v4(),
        )
        .await
        .expect("activate");

    // Visibility changed; access did not
    assert!(app.store.grant(user_id, course).await.is_none());
}
