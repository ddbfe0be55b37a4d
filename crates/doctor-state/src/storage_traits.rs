//! Storage trait definitions for diagnostic sessions
//!
//! - Closed enums for every enumerated record field (`SessionType`,
//!   `AccessLevel`, `SessionStatus`, `Severity`)
//! - `DiagnosticSession` / `DiagnosticReport` records
//! - `DiagnosticStore`: the persistence port consumed by the engine
//!
//! The trait is async and backend-agnostic. An in-memory fake lives in the
//! `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Why a diagnostic session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    SelfRequested,
    Routine,
    AnomalyTriggered,
    OperatorInitiated,
}

impl SessionType {
    pub const ALL: [SessionType; 4] = [
        SessionType::SelfRequested,
        SessionType::Routine,
        SessionType::AnomalyTriggered,
        SessionType::OperatorInitiated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::SelfRequested => "self_requested",
            SessionType::Routine => "routine",
            SessionType::AnomalyTriggered => "anomaly_triggered",
            SessionType::OperatorInitiated => "operator_initiated",
        }
    }

    /// Parse the wire name. Returns `None` for anything outside the enumeration.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Sessions started by an actor outside the agent's trust boundary.
    pub fn is_externally_initiated(&self) -> bool {
        matches!(self, SessionType::OperatorInitiated)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How deep a session may look into memory records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Structural,
    Content,
    Full,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 3] = [
        AccessLevel::Structural,
        AccessLevel::Content,
        AccessLevel::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Structural => "structural",
            AccessLevel::Content => "content",
            AccessLevel::Full => "full",
        }
    }

    /// Parse the wire name. Returns `None` for anything outside the enumeration.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == value)
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a session.
///
/// `Active` → `Completed` | `Cancelled`. Both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finding severity, ordered most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a diagnostic session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random SessionId
    pub fn new() -> Self {
        SessionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a diagnostic report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub String);

impl ReportId {
    /// Generate a new random ReportId
    pub fn new() -> Self {
        ReportId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A diagnostic session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSession {
    pub id: SessionId,
    pub stack_id: String,
    pub session_type: SessionType,
    pub access_level: AccessLevel,
    pub status: SessionStatus,
    pub consent_given: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DiagnosticSession {
    /// A fresh `Active` session with consent recorded.
    pub fn begin(
        stack_id: impl Into<String>,
        session_type: SessionType,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            id: SessionId::new(),
            stack_id: stack_id.into(),
            session_type,
            access_level,
            status: SessionStatus::Active,
            consent_given: true,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// One entry of a persisted report. Structural metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFinding {
    pub severity: Severity,
    pub category: String,
    pub description: String,
    pub recommendation: String,
}

/// A compiled diagnostic report. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub id: ReportId,
    pub stack_id: String,
    pub session_id: SessionId,
    pub findings: Vec<ReportFinding>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl DiagnosticReport {
    pub fn new(
        stack_id: impl Into<String>,
        session_id: SessionId,
        findings: Vec<ReportFinding>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: ReportId::new(),
            stack_id: stack_id.into(),
            session_id,
            findings,
            summary: summary.into(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// DiagnosticStore
// ---------------------------------------------------------------------------

/// Persistence port for sessions and reports.
///
/// Guarantees:
/// - Each call is a single atomic record write or read.
/// - `complete_session` / `cancel_session` only succeed on `Active` sessions
///   and stamp `completed_at`.
/// - Reports have no update path.
/// - Listings are newest first.
#[async_trait]
pub trait DiagnosticStore: Send + Sync {
    /// Persist a new session. Fails with `DuplicateSession` if the ID exists.
    async fn save_session(&self, session: &DiagnosticSession) -> StorageResult<()>;

    /// Fetch a session by ID.
    async fn get_session(&self, id: &SessionId) -> StorageResult<Option<DiagnosticSession>>;

    /// Sessions for a stack, newest first, at most `limit`.
    async fn list_sessions(
        &self,
        stack_id: &str,
        limit: usize,
    ) -> StorageResult<Vec<DiagnosticSession>>;

    /// Transition `Active` → `Completed`, returning the updated record.
    async fn complete_session(&self, id: &SessionId) -> StorageResult<DiagnosticSession>;

    /// Transition `Active` → `Cancelled`, returning the updated record.
    async fn cancel_session(&self, id: &SessionId) -> StorageResult<DiagnosticSession>;

    /// Persist a report. Fails with `DuplicateReport` if the ID exists.
    async fn save_report(&self, report: &DiagnosticReport) -> StorageResult<()>;

    /// Fetch a report by ID.
    async fn get_report(&self, id: &ReportId) -> StorageResult<Option<DiagnosticReport>>;

    /// Reports for a stack, optionally restricted to one session, newest first.
    async fn list_reports(
        &self,
        stack_id: &str,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> StorageResult<Vec<DiagnosticReport>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_type_parse_accepts_only_wire_names() {
        for t in SessionType::ALL {
            assert_eq!(SessionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(SessionType::parse("SelfRequested"), None);
        assert_eq!(SessionType::parse("self-requested"), None);
        assert_eq!(SessionType::parse(""), None);
    }

    #[test]
    fn access_level_parse_accepts_only_wire_names() {
        assert_eq!(AccessLevel::parse("structural"), Some(AccessLevel::Structural));
        assert_eq!(AccessLevel::parse("content"), Some(AccessLevel::Content));
        assert_eq!(AccessLevel::parse("full"), Some(AccessLevel::Full));
        assert_eq!(AccessLevel::parse("FULL"), None);
    }

    #[test]
    fn status_terminality() {
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn serde_uses_snake_case_wire_names() {
        let json = serde_json::to_string(&SessionType::AnomalyTriggered).unwrap();
        assert_eq!(json, "\"anomaly_triggered\"");
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        let status: SessionStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, SessionStatus::Cancelled);
    }

    #[test]
    fn begin_creates_active_session_with_consent() {
        let session =
            DiagnosticSession::begin("stack-a", SessionType::Routine, AccessLevel::Structural);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.consent_given);
        assert!(session.completed_at.is_none());
        assert_eq!(session.stack_id, "stack-a");
    }

    #[test]
    fn ids_are_unique_and_serialize_transparently() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{}\"", a.as_str()));
    }
}
