//! Session lifecycle manager.
//!
//! `start_session` runs the whole diagnostic pipeline for one stack:
//! validate → consent → persist active session → structural checks →
//! compile → persist report → complete session.
//!
//! Validation and consent failures persist nothing. Once the session row
//! exists, any failure leaves it `active` and surfaces
//! [`DoctorError::SessionFailed`]; such sessions can be retired with
//! [`SessionManager::cancel_session`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use doctor_state::{DiagnosticStore, StorageError};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, Instrument};

use crate::compiler::{compile_report, SeverityCounts};
use crate::config::DoctorConfig;
use crate::consent::{evaluate_consent, ConsentVerdict};
use crate::domain::{
    AccessLevel, CheckContext, DiagnosticReport, DiagnosticSession, DoctorError, DoctorResult,
    FailedStage, SessionId, SessionType, ValidationError,
};
use crate::obs;
use crate::ports::{StructuralChecker, TrustAuthority};

/// Per-stack async locks.
///
/// Clones share the same table. [`StackLocks::shared`] is the process-wide
/// table every [`SessionManager`] starts with, so managers built separately
/// for the same stack still serialise. Idle entries are pruned on acquire.
#[derive(Debug, Clone, Default)]
pub struct StackLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl StackLocks {
    /// A fresh table, independent of [`StackLocks::shared`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table.
    pub fn shared() -> Self {
        static SHARED: OnceLock<StackLocks> = OnceLock::new();
        SHARED.get_or_init(StackLocks::new).clone()
    }

    /// Wait for exclusive access to `stack_id`. Released on drop.
    pub async fn acquire(&self, stack_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Only the table holds an idle lock; holders and waiters own a clone.
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
            table.entry(stack_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Stacks currently held or awaited.
    pub fn len(&self) -> usize {
        let table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        table.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Typed request for [`SessionManager::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub session_type: SessionType,
    pub access_level: AccessLevel,
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self {
            session_type: SessionType::SelfRequested,
            access_level: AccessLevel::Structural,
        }
    }
}

impl SessionRequest {
    pub fn new(session_type: SessionType, access_level: AccessLevel) -> Self {
        Self {
            session_type,
            access_level,
        }
    }

    /// Parse caller-supplied wire names. Session type is checked first.
    pub fn parse(session_type: &str, access_level: &str) -> Result<Self, ValidationError> {
        let session_type =
            SessionType::parse(session_type).ok_or_else(|| ValidationError::InvalidSessionType {
                value: session_type.to_string(),
            })?;
        let access_level =
            AccessLevel::parse(access_level).ok_or_else(|| ValidationError::InvalidAccessLevel {
                value: access_level.to_string(),
            })?;
        Ok(Self::new(session_type, access_level))
    }
}

/// A completed session and the report it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session: DiagnosticSession,
    pub report: DiagnosticReport,
}

/// Starts and retires diagnostic sessions for one stack.
///
/// Managers use [`StackLocks::shared`] unless given another table with
/// [`SessionManager::with_locks`].
pub struct SessionManager {
    stack_id: String,
    store: Arc<dyn DiagnosticStore>,
    trust: Arc<dyn TrustAuthority>,
    checker: Arc<dyn StructuralChecker>,
    locks: StackLocks,
}

impl SessionManager {
    pub fn new(
        stack_id: impl Into<String>,
        store: Arc<dyn DiagnosticStore>,
        trust: Arc<dyn TrustAuthority>,
        checker: Arc<dyn StructuralChecker>,
    ) -> Self {
        Self {
            stack_id: stack_id.into(),
            store,
            trust,
            checker,
            locks: StackLocks::shared(),
        }
    }

    pub fn from_config(
        config: &DoctorConfig,
        store: Arc<dyn DiagnosticStore>,
        trust: Arc<dyn TrustAuthority>,
        checker: Arc<dyn StructuralChecker>,
    ) -> Self {
        Self::new(config.stack_id.clone(), store, trust, checker)
    }

    /// Use `locks` instead of the process-wide table.
    pub fn with_locks(mut self, locks: StackLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn stack_id(&self) -> &str {
        &self.stack_id
    }

    /// Start a session from wire names (`"operator_initiated"`, `"full"`, ...).
    pub async fn start_session(
        &self,
        session_type: &str,
        access_level: &str,
    ) -> DoctorResult<SessionOutcome> {
        let request = SessionRequest::parse(session_type, access_level)?;
        self.start(request).await
    }

    /// Run one diagnostic session end to end.
    pub async fn start(&self, request: SessionRequest) -> DoctorResult<SessionOutcome> {
        let _guard = self.locks.acquire(&self.stack_id).await;

        if let ConsentVerdict::Denied { reason } =
            evaluate_consent(self.trust.as_ref(), request.session_type).await
        {
            obs::emit_consent_denied(&self.stack_id, request.session_type);
            return Err(DoctorError::ConsentDenied { reason });
        }

        let session =
            DiagnosticSession::begin(&self.stack_id, request.session_type, request.access_level);
        self.store.save_session(&session).await?;
        obs::emit_session_started(
            &self.stack_id,
            session.id.as_str(),
            session.session_type,
            session.access_level,
        );

        let span = obs::session_span(&self.stack_id, session.id.as_str());
        self.run_pipeline(session).instrument(span).await
    }

    async fn run_pipeline(&self, session: DiagnosticSession) -> DoctorResult<SessionOutcome> {
        let started = Instant::now();
        let ctx = CheckContext {
            stack_id: self.stack_id.clone(),
            session_id: session.id.clone(),
            access_level: session.access_level,
        };

        let raw = self.checker.run(&ctx).await.map_err(|e| {
            self.failed(&session.id, FailedStage::StructuralChecks, format!("{e:#}"))
        })?;
        debug!(raw_findings = raw.len(), "structural checks finished");

        let compiled = compile_report(&raw);
        let counts = SeverityCounts::tally(&compiled.findings);
        let report = DiagnosticReport::new(
            self.stack_id.clone(),
            session.id.clone(),
            compiled.findings,
            compiled.summary,
        );

        self.store
            .save_report(&report)
            .await
            .map_err(|e| self.failed(&session.id, FailedStage::PersistReport, e.to_string()))?;

        let session = self
            .store
            .complete_session(&session.id)
            .await
            .map_err(|e| self.failed(&session.id, FailedStage::CompleteSession, e.to_string()))?;

        obs::emit_session_completed(
            session.id.as_str(),
            report.id.as_str(),
            counts,
            started.elapsed().as_millis() as u64,
        );
        Ok(SessionOutcome { session, report })
    }

    fn failed(&self, session_id: &SessionId, stage: FailedStage, reason: String) -> DoctorError {
        obs::emit_session_failed(session_id.as_str(), stage, &reason);
        DoctorError::SessionFailed {
            session_id: session_id.0.clone(),
            stage,
            reason,
        }
    }

    /// Move an active session of this stack to `cancelled`.
    pub async fn cancel_session(&self, id: &SessionId) -> DoctorResult<DiagnosticSession> {
        let _guard = self.locks.acquire(&self.stack_id).await;

        let not_found = || DoctorError::NotFound {
            kind: "session",
            id: id.0.clone(),
        };

        match self.store.get_session(id).await? {
            Some(s) if s.stack_id == self.stack_id => {}
            _ => return Err(not_found()),
        }

        match self.store.cancel_session(id).await {
            Ok(session) => {
                obs::emit_session_cancelled(session.id.as_str());
                Ok(session)
            }
            Err(StorageError::SessionNotFound { .. }) => Err(not_found()),
            Err(StorageError::InvalidSessionState { status, .. }) => {
                Err(DoctorError::InvalidTransition {
                    session_id: id.0.clone(),
                    status,
                    action: "cancelled",
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
