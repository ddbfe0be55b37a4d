//! End-to-end session pipeline tests against in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use doctor_core::fakes::{
    FailingChecker, FailingTrustAuthority, MemoryTrustAuthority, ScriptedChecker,
};
use doctor_core::{
    AccessLevel, DiagnosticsQuery, DoctorError, FailedStage, SessionManager, SessionRequest,
    SessionStatus, SessionType, Severity, StackLocks, StructuralChecker, StructuralFinding,
    TrustAssessment, TrustAuthority, ValidationError, STACK_OWNER,
};
use doctor_state::fakes::MemoryDiagnosticStore;
use doctor_state::{DiagnosticStore, SurrealDiagnosticStore};

const STACK: &str = "stack-a";

fn trusted_owner() -> MemoryTrustAuthority {
    MemoryTrustAuthority::new().with_assessment(
        TrustAssessment::new(STACK_OWNER)
            .with_dimension("general", 0.95)
            .with_authority("all"),
    )
}

fn mixed_findings() -> Vec<StructuralFinding> {
    vec![
        StructuralFinding::new(
            "orphaned_reference",
            Severity::Error,
            "episode",
            "ep-1",
            "Episode #ep-1 references missing belief #b-9",
        ),
        StructuralFinding::new(
            "stale_relationship",
            Severity::Warning,
            "relationship",
            "rel-1",
            "Relationship #rel-1 idle for 120 days",
        ),
        StructuralFinding::new(
            "stale_goal",
            Severity::Warning,
            "goal",
            "goal-1",
            "Goal #goal-1 untouched for 90 days",
        ),
        StructuralFinding::new(
            "custom_check",
            Severity::Info,
            "note",
            "note-1",
            "Note #note-1 has 0 links",
        ),
    ]
}

struct Harness {
    store: Arc<MemoryDiagnosticStore>,
    trust: Arc<MemoryTrustAuthority>,
    checker: Arc<ScriptedChecker>,
    manager: SessionManager,
    query: DiagnosticsQuery,
}

fn harness(trust: MemoryTrustAuthority, checker: ScriptedChecker) -> Harness {
    let store = Arc::new(MemoryDiagnosticStore::new());
    let trust = Arc::new(trust);
    let checker = Arc::new(checker);
    let manager = SessionManager::new(
        STACK,
        store.clone() as Arc<dyn DiagnosticStore>,
        trust.clone() as Arc<dyn TrustAuthority>,
        checker.clone() as Arc<dyn StructuralChecker>,
    );
    let query = DiagnosticsQuery::new(STACK, store.clone() as Arc<dyn DiagnosticStore>);
    Harness {
        store,
        trust,
        checker,
        manager,
        query,
    }
}

// ---- validation ----

#[tokio::test]
async fn invalid_session_type_persists_nothing() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());

    let err = h
        .manager
        .start_session("invalid_type", "structural")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DoctorError::Validation(ValidationError::InvalidSessionType { .. })
    ));
    assert!(err.to_string().contains("Invalid session type"));
    assert_eq!(h.store.session_count(), 0);
    assert_eq!(h.store.report_count(), 0);
    assert_eq!(h.trust.calls(), 0);
    assert_eq!(h.checker.calls(), 0);
}

#[tokio::test]
async fn invalid_access_level_persists_nothing() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());

    let err = h
        .manager
        .start_session("operator_initiated", "root")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DoctorError::Validation(ValidationError::InvalidAccessLevel { .. })
    ));
    assert_eq!(
        err.to_string(),
        "Invalid access level 'root'. Must be one of: content, full, structural"
    );
    assert_eq!(h.store.session_count(), 0);
    assert_eq!(h.trust.calls(), 0);
}

// ---- consent gate ----

#[tokio::test]
async fn operator_session_without_trust_is_denied() {
    let h = harness(MemoryTrustAuthority::new(), ScriptedChecker::healthy());

    let err = h
        .manager
        .start_session("operator_initiated", "structural")
        .await
        .unwrap_err();

    assert!(matches!(err, DoctorError::ConsentDenied { .. }));
    assert!(err.to_string().contains("Insufficient trust"));
    assert_eq!(h.store.session_count(), 0);
    assert_eq!(h.checker.calls(), 0);
    assert_eq!(h.trust.calls(), 1);
}

#[tokio::test]
async fn operator_session_with_trust_completes() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());

    let outcome = h
        .manager
        .start_session("operator_initiated", "structural")
        .await
        .unwrap();

    assert_eq!(outcome.session.session_type, SessionType::OperatorInitiated);
    assert_eq!(outcome.session.status, SessionStatus::Completed);
    assert!(outcome.session.consent_given);
    assert_eq!(h.trust.calls(), 1);
}

#[tokio::test]
async fn low_trust_score_is_denied() {
    let trust = MemoryTrustAuthority::new().with_assessment(
        TrustAssessment::new(STACK_OWNER)
            .with_dimension("general", 0.1)
            .with_authority("all"),
    );
    let h = harness(trust, ScriptedChecker::healthy());

    let err = h
        .manager
        .start(SessionRequest::new(
            SessionType::OperatorInitiated,
            AccessLevel::Full,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, DoctorError::ConsentDenied { .. }));
    assert_eq!(h.store.session_count(), 0);
}

#[tokio::test]
async fn trust_is_consulted_afresh_each_time() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());
    h.manager
        .start_session("operator_initiated", "structural")
        .await
        .unwrap();

    h.trust.revoke(STACK_OWNER);
    let err = h
        .manager
        .start_session("operator_initiated", "structural")
        .await
        .unwrap_err();
    assert!(matches!(err, DoctorError::ConsentDenied { .. }));
    assert_eq!(h.trust.calls(), 2);
    assert_eq!(h.store.session_count(), 1);
}

#[tokio::test]
async fn self_initiated_types_never_consult_trust() {
    let store = Arc::new(MemoryDiagnosticStore::new());
    let trust = Arc::new(FailingTrustAuthority::new("trust must not be queried"));
    let manager = SessionManager::new(
        STACK,
        store.clone(),
        trust.clone(),
        Arc::new(ScriptedChecker::healthy()),
    );

    for t in ["self_requested", "routine", "anomaly_triggered"] {
        let outcome = manager.start_session(t, "structural").await.unwrap();
        assert_eq!(outcome.session.session_type.as_str(), t);
    }
    assert_eq!(trust.calls(), 0);
    assert_eq!(store.session_count(), 3);
}

#[tokio::test]
async fn trust_errors_fail_closed() {
    let store = Arc::new(MemoryDiagnosticStore::new());
    let manager = SessionManager::new(
        STACK,
        store.clone(),
        Arc::new(FailingTrustAuthority::new("trust backend offline")),
        Arc::new(ScriptedChecker::healthy()),
    );

    let err = manager
        .start_session("operator_initiated", "structural")
        .await
        .unwrap_err();
    match err {
        DoctorError::ConsentDenied { reason } => assert!(reason.contains("trust backend offline")),
        other => panic!("expected ConsentDenied, got {other:?}"),
    }
    assert_eq!(store.session_count(), 0);
}

// ---- lifecycle ----

#[tokio::test]
async fn completed_session_has_linked_report_and_is_latest() {
    let h = harness(trusted_owner(), ScriptedChecker::new(mixed_findings()));

    let outcome = h.manager.start(SessionRequest::default()).await.unwrap();

    assert_eq!(outcome.session.status, SessionStatus::Completed);
    assert!(outcome.session.completed_at.is_some());
    assert_eq!(outcome.session.session_type, SessionType::SelfRequested);
    assert_eq!(outcome.session.access_level, AccessLevel::Structural);
    assert_eq!(outcome.report.session_id, outcome.session.id);
    assert_eq!(outcome.report.stack_id, STACK);
    assert_eq!(
        outcome.report.summary,
        "Found 4 finding(s): 1 error(s), 2 warning(s), 1 info"
    );
    assert_eq!(
        outcome.report.findings[3].recommendation,
        "Review finding and take appropriate action"
    );

    let latest = h.query.get_report("latest").await.unwrap();
    assert_eq!(latest, outcome.report);

    let stored = h.query.get_session(&outcome.session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
}

#[tokio::test]
async fn checker_sees_session_context() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());
    let outcome = h.manager.start_session("routine", "content").await.unwrap();

    let contexts = h.checker.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].stack_id, STACK);
    assert_eq!(contexts[0].session_id, outcome.session.id);
    assert_eq!(contexts[0].access_level, AccessLevel::Content);
}

#[tokio::test]
async fn healthy_graph_yields_healthy_summary() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());
    let outcome = h.manager.start_session("routine", "structural").await.unwrap();
    assert!(outcome.report.findings.is_empty());
    assert!(outcome.report.summary.to_lowercase().contains("healthy"));
}

#[tokio::test]
async fn lifecycle_against_surreal_store() {
    let store = Arc::new(SurrealDiagnosticStore::in_memory().await.unwrap());
    let manager = SessionManager::new(
        STACK,
        store.clone(),
        Arc::new(trusted_owner()),
        Arc::new(ScriptedChecker::new(mixed_findings())),
    );
    let query = DiagnosticsQuery::new(STACK, store);

    let outcome = manager
        .start_session("operator_initiated", "full")
        .await
        .unwrap();
    assert_eq!(outcome.session.status, SessionStatus::Completed);

    let latest = query.get_report("latest").await.unwrap();
    assert_eq!(latest.id, outcome.report.id);
    assert_eq!(latest.findings, outcome.report.findings);

    let sessions = query.list_sessions(None).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Completed);
}

// ---- failures ----

#[tokio::test]
async fn checker_failure_leaves_session_active() {
    let store = Arc::new(MemoryDiagnosticStore::new());
    let manager = SessionManager::new(
        STACK,
        store.clone(),
        Arc::new(trusted_owner()),
        Arc::new(FailingChecker::new("memory graph unavailable")),
    );

    let err = manager.start_session("routine", "structural").await.unwrap_err();
    let session_id = match err {
        DoctorError::SessionFailed {
            session_id,
            stage,
            reason,
        } => {
            assert_eq!(stage, FailedStage::StructuralChecks);
            assert!(reason.contains("memory graph unavailable"));
            session_id
        }
        other => panic!("expected SessionFailed, got {other:?}"),
    };

    let sessions = store.list_sessions(STACK, 10).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id.as_str(), session_id);
    assert_eq!(sessions[0].status, SessionStatus::Active);
    assert!(sessions[0].completed_at.is_none());
    assert_eq!(store.report_count(), 0);
}

#[tokio::test]
async fn report_write_failure_leaves_session_active() {
    let h = harness(trusted_owner(), ScriptedChecker::new(mixed_findings()));
    h.store.fail_report_writes(true);

    let err = h.manager.start_session("routine", "structural").await.unwrap_err();
    assert!(matches!(
        err,
        DoctorError::SessionFailed {
            stage: FailedStage::PersistReport,
            ..
        }
    ));

    let sessions = h.query.list_sessions(None).await.unwrap();
    assert_eq!(sessions[0].status, SessionStatus::Active);
    assert!(h.query.latest_report().await.unwrap().is_none());
}

// ---- cancellation ----

#[tokio::test]
async fn cancel_retires_failed_session_once() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());
    h.store.fail_report_writes(true);
    let err = h.manager.start_session("routine", "structural").await.unwrap_err();
    let DoctorError::SessionFailed { session_id, .. } = err else {
        panic!("expected SessionFailed");
    };
    let id = doctor_core::SessionId(session_id);

    let cancelled = h.manager.cancel_session(&id).await.unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);
    assert!(cancelled.completed_at.is_some());

    let err = h.manager.cancel_session(&id).await.unwrap_err();
    assert!(matches!(err, DoctorError::InvalidTransition { .. }));
}

#[tokio::test]
async fn cancel_completed_or_unknown_session_is_rejected() {
    let h = harness(trusted_owner(), ScriptedChecker::healthy());
    let outcome = h.manager.start_session("routine", "structural").await.unwrap();

    let err = h.manager.cancel_session(&outcome.session.id).await.unwrap_err();
    match err {
        DoctorError::InvalidTransition { status, .. } => assert_eq!(status, "completed"),
        other => panic!("expected InvalidTransition, got {other:?}"),
    }

    let err = h
        .manager
        .cancel_session(&doctor_core::SessionId::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn cancel_ignores_other_stacks() {
    let store = Arc::new(MemoryDiagnosticStore::new());
    store.fail_report_writes(true);
    let a = SessionManager::new(
        "stack-a",
        store.clone(),
        Arc::new(trusted_owner()),
        Arc::new(ScriptedChecker::healthy()),
    );
    let b = SessionManager::new(
        "stack-b",
        store.clone(),
        Arc::new(trusted_owner()),
        Arc::new(ScriptedChecker::healthy()),
    );

    let DoctorError::SessionFailed { session_id, .. } =
        a.start_session("routine", "structural").await.unwrap_err()
    else {
        panic!("expected SessionFailed");
    };
    let id = doctor_core::SessionId(session_id);

    assert!(b.cancel_session(&id).await.unwrap_err().is_not_found());
    assert_eq!(
        a.cancel_session(&id).await.unwrap().status,
        SessionStatus::Cancelled
    );
}

// ---- concurrency ----

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_starts_on_one_stack_are_serialised() {
    let store = Arc::new(MemoryDiagnosticStore::new());
    let locks = StackLocks::new();
    let make = |locks: StackLocks| {
        Arc::new(
            SessionManager::new(
                STACK,
                store.clone(),
                Arc::new(trusted_owner()),
                Arc::new(ScriptedChecker::healthy().with_delay(Duration::from_millis(50))),
            )
            .with_locks(locks),
        )
    };
    let first = make(locks.clone());
    let second = make(locks.clone());

    let t1 = tokio::spawn(async move { first.start_session("routine", "structural").await });
    let t2 = tokio::spawn(async move { second.start_session("routine", "structural").await });
    let o1 = t1.await.unwrap().unwrap();
    let o2 = t2.await.unwrap().unwrap();

    let (earlier, later) = if o1.session.started_at <= o2.session.started_at {
        (o1, o2)
    } else {
        (o2, o1)
    };
    let earlier_done = earlier.session.completed_at.unwrap();
    assert!(earlier_done <= later.session.started_at);

    let sessions = store.list_sessions(STACK, 10).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.status == SessionStatus::Completed));
    assert_eq!(store.report_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn independently_built_managers_share_the_default_locks() {
    const SHARED_STACK: &str = "stack-default-locks";
    let store = Arc::new(MemoryDiagnosticStore::new());
    let make = || {
        Arc::new(SessionManager::new(
            SHARED_STACK,
            store.clone(),
            Arc::new(trusted_owner()),
            Arc::new(ScriptedChecker::healthy().with_delay(Duration::from_millis(50))),
        ))
    };
    let dashboard = make();
    let cli = make();

    let t1 = tokio::spawn(async move { dashboard.start_session("routine", "structural").await });
    let t2 = tokio::spawn(async move { cli.start_session("self_requested", "structural").await });
    let mut outcomes = vec![t1.await.unwrap().unwrap(), t2.await.unwrap().unwrap()];
    outcomes.sort_by_key(|o| o.session.started_at);

    let earlier_done = outcomes[0].session.completed_at.unwrap();
    assert!(earlier_done <= outcomes[1].session.started_at);
}
