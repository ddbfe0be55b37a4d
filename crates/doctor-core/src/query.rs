//! Read accessors over past sessions and reports for one stack.
//!
//! All operations are read-only and may run concurrently with
//! `SessionManager::start`. Records belonging to another stack are reported
//! as not found.

use std::sync::Arc;

use doctor_state::DiagnosticStore;
use tracing::debug;

use crate::config::{DoctorConfig, DEFAULT_SESSION_LIST_LIMIT};
use crate::domain::{
    DiagnosticReport, DiagnosticSession, DoctorError, DoctorResult, ReportId, SessionId,
};

/// Sentinel accepted by [`DiagnosticsQuery::get_report`].
pub const LATEST: &str = "latest";

/// How a report is addressed by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSelector {
    /// Most recently created report for the stack.
    Latest,
    /// A report id, or a session id to fall back on.
    Id(String),
}

impl From<&str> for ReportSelector {
    fn from(value: &str) -> Self {
        if value == LATEST {
            ReportSelector::Latest
        } else {
            ReportSelector::Id(value.to_string())
        }
    }
}

/// Read-only view of the diagnostic store, bound to one stack.
#[derive(Clone)]
pub struct DiagnosticsQuery {
    stack_id: String,
    store: Arc<dyn DiagnosticStore>,
    default_limit: usize,
}

impl DiagnosticsQuery {
    pub fn new(stack_id: impl Into<String>, store: Arc<dyn DiagnosticStore>) -> Self {
        Self {
            stack_id: stack_id.into(),
            store,
            default_limit: DEFAULT_SESSION_LIST_LIMIT,
        }
    }

    pub fn from_config(config: &DoctorConfig, store: Arc<dyn DiagnosticStore>) -> Self {
        Self::new(config.stack_id.clone(), store).with_default_limit(config.session_list_limit)
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn stack_id(&self) -> &str {
        &self.stack_id
    }

    /// Sessions for the stack, newest first.
    pub async fn list_sessions(
        &self,
        limit: Option<usize>,
    ) -> DoctorResult<Vec<DiagnosticSession>> {
        let limit = limit.unwrap_or(self.default_limit);
        Ok(self.store.list_sessions(&self.stack_id, limit).await?)
    }

    pub async fn get_session(&self, id: &SessionId) -> DoctorResult<DiagnosticSession> {
        self.store
            .get_session(id)
            .await?
            .filter(|s| s.stack_id == self.stack_id)
            .ok_or_else(|| DoctorError::NotFound {
                kind: "session",
                id: id.0.clone(),
            })
    }

    /// Most recent report for the stack, if any.
    pub async fn latest_report(&self) -> DoctorResult<Option<DiagnosticReport>> {
        let reports = self.store.list_reports(&self.stack_id, None, 1).await?;
        Ok(reports.into_iter().next())
    }

    /// Reports produced by one session, newest first.
    pub async fn reports_for_session(
        &self,
        id: &SessionId,
    ) -> DoctorResult<Vec<DiagnosticReport>> {
        Ok(self
            .store
            .list_reports(&self.stack_id, Some(id), self.default_limit)
            .await?)
    }

    /// Resolve `"latest"`, a report id, or a session id to a report.
    ///
    /// Report-id lookup wins; a miss falls back to the newest report whose
    /// `session_id` equals the argument.
    pub async fn get_report(&self, id_or_latest: &str) -> DoctorResult<DiagnosticReport> {
        let not_found = || DoctorError::NotFound {
            kind: "report",
            id: id_or_latest.to_string(),
        };

        match ReportSelector::from(id_or_latest) {
            ReportSelector::Latest => self.latest_report().await?.ok_or_else(not_found),
            ReportSelector::Id(id) => {
                let direct = self
                    .store
                    .get_report(&ReportId(id.clone()))
                    .await?
                    .filter(|r| r.stack_id == self.stack_id);
                if let Some(report) = direct {
                    return Ok(report);
                }

                debug!(id = %id, "no report with this id, trying session id");
                self.store
                    .list_reports(&self.stack_id, Some(&SessionId(id)), 1)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(not_found)
            }
        }
    }
}
