//! Structured observability hooks for diagnostic session lifecycle events.
//!
//! - Session-scoped tracing spans via `session_span`
//! - Emission functions for start, consent, completion, failure, cancellation
//!
//! Events are emitted at `info!` (failures at `warn!`). Identifiers, counts
//! and enum names only; finding text never goes to the log.

use tracing::{info, warn};

use crate::compiler::SeverityCounts;
use crate::domain::{AccessLevel, FailedStage, SessionType};

/// Span tagging everything logged inside one session pipeline.
///
/// Attach it with `tracing::Instrument` so the pipeline future stays `Send`:
///
/// ```ignore
/// pipeline.instrument(session_span("stack-a", "5f0c...")).await
/// ```
pub fn session_span(stack_id: &str, session_id: &str) -> tracing::Span {
    tracing::info_span!("doctor.session", stack_id = %stack_id, session_id = %session_id)
}

/// Emit event: consent gate evaluated.
pub fn emit_consent_evaluated(session_type: SessionType, granted: bool, trust_consulted: bool) {
    info!(
        event = "consent.evaluated",
        session_type = %session_type,
        granted = granted,
        trust_consulted = trust_consulted,
    );
}

/// Emit event: session persisted as active.
pub fn emit_session_started(
    stack_id: &str,
    session_id: &str,
    session_type: SessionType,
    access_level: AccessLevel,
) {
    info!(
        event = "session.started",
        stack_id = %stack_id,
        session_id = %session_id,
        session_type = %session_type,
        access_level = %access_level,
    );
}

/// Emit event: consent denied, nothing persisted.
pub fn emit_consent_denied(stack_id: &str, session_type: SessionType) {
    warn!(
        event = "session.consent_denied",
        stack_id = %stack_id,
        session_type = %session_type,
    );
}

/// Emit event: report saved and session completed.
pub fn emit_session_completed(
    session_id: &str,
    report_id: &str,
    counts: SeverityCounts,
    duration_ms: u64,
) {
    info!(
        event = "session.completed",
        session_id = %session_id,
        report_id = %report_id,
        errors = counts.errors,
        warnings = counts.warnings,
        infos = counts.infos,
        duration_ms = duration_ms,
    );
}

/// Emit event: pipeline stage failed; the session stays active.
pub fn emit_session_failed(session_id: &str, stage: FailedStage, error: &dyn std::fmt::Display) {
    warn!(
        event = "session.failed",
        session_id = %session_id,
        stage = %stage,
        error = %error,
    );
}

/// Emit event: session cancelled.
pub fn emit_session_cancelled(session_id: &str) {
    info!(event = "session.cancelled", session_id = %session_id);
}
