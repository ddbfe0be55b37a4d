//! Error taxonomy for the diagnostic engine.

use doctor_state::{AccessLevel, SessionType, StorageError};

fn expected_list(mut names: Vec<&'static str>) -> String {
    names.sort_unstable();
    names.join(", ")
}

fn session_type_choices() -> String {
    expected_list(SessionType::ALL.iter().map(|t| t.as_str()).collect())
}

fn access_level_choices() -> String {
    expected_list(AccessLevel::ALL.iter().map(|l| l.as_str()).collect())
}

/// Rejected caller input. Nothing is persisted when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid session type '{value}'. Must be one of: {}", session_type_choices())]
    InvalidSessionType { value: String },

    #[error("Invalid access level '{value}'. Must be one of: {}", access_level_choices())]
    InvalidAccessLevel { value: String },
}

/// Pipeline stage a started session failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    StructuralChecks,
    PersistReport,
    CompleteSession,
}

impl std::fmt::Display for FailedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedStage::StructuralChecks => write!(f, "structural checks"),
            FailedStage::PersistReport => write!(f, "report persistence"),
            FailedStage::CompleteSession => write!(f, "session completion"),
        }
    }
}

/// Diagnostic engine errors.
#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Insufficient trust for operator-initiated diagnostic session: {reason}")]
    ConsentDenied { reason: String },

    #[error("No {kind} found for ID: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("diagnostic session {session_id} is {status} and cannot be {action}")]
    InvalidTransition {
        session_id: String,
        status: String,
        action: &'static str,
    },

    /// The session was persisted as `active` and left there for inspection.
    #[error("{stage} failed for session {session_id}: {reason}")]
    SessionFailed {
        session_id: String,
        stage: FailedStage,
        reason: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DoctorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DoctorError::NotFound { .. })
    }
}

/// Result type for engine operations.
pub type DoctorResult<T> = std::result::Result<T, DoctorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_session_type_lists_sorted_choices() {
        let err = ValidationError::InvalidSessionType {
            value: "invalid_type".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid session type 'invalid_type'. Must be one of: \
             anomaly_triggered, operator_initiated, routine, self_requested"
        );
    }

    #[test]
    fn invalid_access_level_lists_sorted_choices() {
        let err = ValidationError::InvalidAccessLevel {
            value: "root".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid access level 'root'. Must be one of: content, full, structural"
        );
    }

    #[test]
    fn consent_denied_is_distinct_from_validation() {
        let err = DoctorError::ConsentDenied {
            reason: "no authority grant".into(),
        };
        assert!(err.to_string().contains("Insufficient trust"));
        assert!(!matches!(err, DoctorError::Validation(_)));
    }

    #[test]
    fn session_failed_names_stage_and_session() {
        let err = DoctorError::SessionFailed {
            session_id: "abc".into(),
            stage: FailedStage::StructuralChecks,
            reason: "graph unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("structural checks"));
        assert!(msg.contains("abc"));
        assert!(msg.contains("graph unavailable"));
    }
}
