//! Domain models for the diagnostic engine.
//!
//! Persisted records and their enums live in `doctor-state` and are
//! re-exported here; this module adds the engine-side types:
//! - `StructuralFinding`: raw input from the check runner
//! - `TrustAssessment` / `TrustDecision`: trust subsystem data
//! - `DoctorError` / `ValidationError`: error taxonomy

pub mod error;
pub mod finding;
pub mod trust;

pub use doctor_state::{
    AccessLevel, DiagnosticReport, DiagnosticSession, ReportFinding, ReportId, SessionId,
    SessionStatus, SessionType, Severity,
};
pub use error::{DoctorError, DoctorResult, FailedStage, ValidationError};
pub use finding::{CheckContext, StructuralFinding};
pub use trust::{
    AuthorityGrant, TrustAssessment, TrustDecision, DIAGNOSTIC_ACTION, STACK_OWNER,
};
