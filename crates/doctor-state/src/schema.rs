//! SurrealDB row types for diagnostic sessions and reports.
//!
//! Enumerated fields are stored as their wire strings and converted back to
//! the closed enums at the storage boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::{
    AccessLevel, DiagnosticReport, DiagnosticSession, ReportFinding, ReportId, SessionId,
    SessionStatus, SessionType, StorageResult,
};

/// Serialize chrono DateTime as a SurrealDB datetime
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Serialize optional chrono DateTime as a SurrealDB datetime
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let sd = SurrealDatetime::from(*d);
                serde::Serialize::serialize(&Some(sd), serializer)
            }
            None => serde::Serialize::serialize(&None::<SurrealDatetime>, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Row in `diagnostic_sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SessionRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub session_id: String,
    pub stack_id: String,
    /// "self_requested" | "routine" | "anomaly_triggered" | "operator_initiated"
    pub session_type: String,
    /// "structural" | "content" | "full"
    pub access_level: String,
    /// "active" | "completed" | "cancelled"
    pub status: String,
    pub consent_given: bool,
    #[serde(with = "surreal_datetime")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    pub fn from_session(session: &DiagnosticSession) -> Self {
        Self {
            id: None,
            session_id: session.id.0.clone(),
            stack_id: session.stack_id.clone(),
            session_type: session.session_type.as_str().to_string(),
            access_level: session.access_level.as_str().to_string(),
            status: session.status.as_str().to_string(),
            consent_given: session.consent_given,
            started_at: session.started_at,
            completed_at: session.completed_at,
        }
    }

    pub fn into_session(self) -> StorageResult<DiagnosticSession> {
        let session_type = SessionType::parse(&self.session_type).ok_or_else(|| {
            StorageError::Backend(format!("unknown session type: {}", self.session_type))
        })?;
        let access_level = AccessLevel::parse(&self.access_level).ok_or_else(|| {
            StorageError::Backend(format!("unknown access level: {}", self.access_level))
        })?;
        let status = SessionStatus::parse(&self.status)
            .ok_or_else(|| StorageError::Backend(format!("unknown status: {}", self.status)))?;

        Ok(DiagnosticSession {
            id: SessionId(self.session_id),
            stack_id: self.stack_id,
            session_type,
            access_level,
            status,
            consent_given: self.consent_given,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

/// Row in `diagnostic_reports`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ReportRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub report_id: String,
    pub stack_id: String,
    pub session_id: String,
    pub findings: Vec<ReportFinding>,
    pub summary: String,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ReportRow {
    pub fn from_report(report: &DiagnosticReport) -> Self {
        Self {
            id: None,
            report_id: report.id.0.clone(),
            stack_id: report.stack_id.clone(),
            session_id: report.session_id.0.clone(),
            findings: report.findings.clone(),
            summary: report.summary.clone(),
            created_at: report.created_at,
        }
    }

    pub fn into_report(self) -> DiagnosticReport {
        DiagnosticReport {
            id: ReportId(self.report_id),
            stack_id: self.stack_id,
            session_id: SessionId(self.session_id),
            findings: self.findings,
            summary: self.summary,
            created_at: self.created_at,
        }
    }
}
