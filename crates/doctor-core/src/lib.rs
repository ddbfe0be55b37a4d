//! Doctor Core: diagnostic session engine for agent memory stacks
//!
//! Runs consent-gated, privacy-preserving health checks over a memory
//! graph and keeps an auditable record of each session and its report.
//!
//! - [`SessionManager`]: validate → consent → check → compile → persist
//! - [`compile_report`]: structural findings → report entries + summary
//! - [`DiagnosticsQuery`]: listing and lookup of past sessions and reports
//! - [`ports`]: the structural checker and trust authority collaborators
//!
//! Persistence lives in `doctor-state`; its records are re-exported here.

pub mod compiler;
pub mod config;
pub mod consent;
pub mod domain;
pub mod fakes;
pub mod obs;
pub mod ports;
pub mod query;
pub mod recommendation;
pub mod reporting;
pub mod session;
pub mod telemetry;

pub use compiler::{compile_report, summarize, CompiledReport, SeverityCounts, HEALTHY_SUMMARY};
pub use config::{ConfigError, DoctorConfig, LogFormat, DEFAULT_SESSION_LIST_LIMIT};
pub use consent::{evaluate_consent, ConsentVerdict};
pub use domain::{
    AccessLevel, AuthorityGrant, CheckContext, DiagnosticReport, DiagnosticSession, DoctorError,
    DoctorResult, FailedStage, ReportFinding, ReportId, SessionId, SessionStatus, SessionType,
    Severity, StructuralFinding, TrustAssessment, TrustDecision, ValidationError,
    DIAGNOSTIC_ACTION, STACK_OWNER,
};
pub use ports::{StructuralChecker, TrustAuthority};
pub use query::{DiagnosticsQuery, ReportSelector, LATEST};
pub use recommendation::{recommendation_for, DEFAULT_RECOMMENDATION};
pub use reporting::{
    render_report_text, render_session_list, render_session_text, short_id, write_report_json,
    ReportView, SessionListEntry, SessionStartView,
};
pub use session::{SessionManager, SessionOutcome, SessionRequest, StackLocks};

pub use doctor_state::{DiagnosticStore, StorageError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
