//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryDiagnosticStore`, which satisfies the `DiagnosticStore`
//! contract without any external dependencies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

#[derive(Debug, Default)]
struct StoreState {
    // Insertion order doubles as creation order.
    sessions: Vec<DiagnosticSession>,
    reports: Vec<DiagnosticReport>,
}

/// In-memory diagnostic store backed by insertion-ordered vectors.
///
/// `fail_report_writes(true)` makes every subsequent `save_report` fail with
/// a backend error, for exercising the engine's recovery path.
#[derive(Debug, Default)]
pub struct MemoryDiagnosticStore {
    state: Mutex<StoreState>,
    report_writes_fail: AtomicBool,
}

impl MemoryDiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle injected `save_report` failures.
    pub fn fail_report_writes(&self, fail: bool) {
        self.report_writes_fail.store(fail, Ordering::SeqCst);
    }

    /// Number of persisted sessions across all stacks.
    pub fn session_count(&self) -> usize {
        self.lock().map(|s| s.sessions.len()).unwrap_or(0)
    }

    /// Number of persisted reports across all stacks.
    pub fn report_count(&self) -> usize {
        self.lock().map(|s| s.reports.len()).unwrap_or(0)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|e| StorageError::Backend(format!("store lock poisoned: {e}")))
    }

    fn finish(
        &self,
        id: &SessionId,
        target: SessionStatus,
    ) -> StorageResult<DiagnosticSession> {
        let mut state = self.lock()?;
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == *id)
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: id.0.clone(),
            })?;
        if session.status != SessionStatus::Active {
            return Err(StorageError::InvalidSessionState {
                session_id: id.0.clone(),
                status: session.status.to_string(),
                expected: SessionStatus::Active.to_string(),
            });
        }
        session.status = target;
        session.completed_at = Some(Utc::now());
        Ok(session.clone())
    }
}

#[async_trait]
impl DiagnosticStore for MemoryDiagnosticStore {
    async fn save_session(&self, session: &DiagnosticSession) -> StorageResult<()> {
        let mut state = self.lock()?;
        if state.sessions.iter().any(|s| s.id == session.id) {
            return Err(StorageError::DuplicateSession {
                session_id: session.id.0.clone(),
            });
        }
        state.sessions.push(session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> StorageResult<Option<DiagnosticSession>> {
        let state = self.lock()?;
        Ok(state.sessions.iter().find(|s| s.id == *id).cloned())
    }

    async fn list_sessions(
        &self,
        stack_id: &str,
        limit: usize,
    ) -> StorageResult<Vec<DiagnosticSession>> {
        let state = self.lock()?;
        Ok(state
            .sessions
            .iter()
            .rev()
            .filter(|s| s.stack_id == stack_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn complete_session(&self, id: &SessionId) -> StorageResult<DiagnosticSession> {
        self.finish(id, SessionStatus::Completed)
    }

    async fn cancel_session(&self, id: &SessionId) -> StorageResult<DiagnosticSession> {
        self.finish(id, SessionStatus::Cancelled)
    }

    async fn save_report(&self, report: &DiagnosticReport) -> StorageResult<()> {
        if self.report_writes_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected report write failure".into()));
        }
        let mut state = self.lock()?;
        if state.reports.iter().any(|r| r.id == report.id) {
            return Err(StorageError::DuplicateReport {
                report_id: report.id.0.clone(),
            });
        }
        state.reports.push(report.clone());
        Ok(())
    }

    async fn get_report(&self, id: &ReportId) -> StorageResult<Option<DiagnosticReport>> {
        let state = self.lock()?;
        Ok(state.reports.iter().find(|r| r.id == *id).cloned())
    }

    async fn list_reports(
        &self,
        stack_id: &str,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> StorageResult<Vec<DiagnosticReport>> {
        let state = self.lock()?;
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|r| r.stack_id == stack_id)
            .filter(|r| session_id.map(|sid| r.session_id == *sid).unwrap_or(true))
            .take(limit)
            .cloned()
            .collect())
    }
}
