//! Raw structural findings produced by the external check runner.

use doctor_state::{AccessLevel, SessionId, Severity};
use serde::{Deserialize, Serialize};

/// A single structural finding about the memory graph.
///
/// `message` is rendered by the check runner from structural facts only
/// (IDs, counts, scores). `memory_type` and `memory_id` locate the record
/// but never leave the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFinding {
    /// Check category, e.g. "orphaned_reference".
    pub check: String,
    pub severity: Severity,
    pub memory_type: String,
    pub memory_id: String,
    pub message: String,
}

impl StructuralFinding {
    pub fn new(
        check: impl Into<String>,
        severity: Severity,
        memory_type: impl Into<String>,
        memory_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            severity,
            memory_type: memory_type.into(),
            memory_id: memory_id.into(),
            message: message.into(),
        }
    }
}

/// What the check runner is told about the session it runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckContext {
    pub stack_id: String,
    pub session_id: SessionId,
    pub access_level: AccessLevel,
}
