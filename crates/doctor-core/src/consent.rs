//! Consent gate for diagnostic sessions.
//!
//! Only operator-initiated sessions need the stack owner's trust; every
//! other session type is consented by the agent itself. The gate fails
//! closed: a trust query that errors is a denial.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{SessionType, DIAGNOSTIC_ACTION, STACK_OWNER};
use crate::obs;
use crate::ports::TrustAuthority;

/// Outcome of a consent evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ConsentVerdict {
    Granted,
    Denied { reason: String },
}

impl ConsentVerdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, ConsentVerdict::Granted)
    }
}

/// Decide whether a session of `session_type` may start.
///
/// The trust port is queried once per call for operator-initiated sessions
/// and never otherwise.
pub async fn evaluate_consent(
    trust: &dyn TrustAuthority,
    session_type: SessionType,
) -> ConsentVerdict {
    if !session_type.is_externally_initiated() {
        obs::emit_consent_evaluated(session_type, true, false);
        return ConsentVerdict::Granted;
    }

    let verdict = match trust.authorize(STACK_OWNER, DIAGNOSTIC_ACTION).await {
        Ok(decision) if decision.allowed => ConsentVerdict::Granted,
        Ok(decision) => ConsentVerdict::Denied {
            reason: decision.reason.unwrap_or_else(|| {
                format!("trust gate denied '{DIAGNOSTIC_ACTION}' for '{STACK_OWNER}'")
            }),
        },
        Err(e) => {
            warn!(
                event = "consent.trust_error",
                entity = STACK_OWNER,
                action = DIAGNOSTIC_ACTION,
                error = %e,
            );
            ConsentVerdict::Denied {
                reason: format!("trust query failed: {e}"),
            }
        }
    };

    obs::emit_consent_evaluated(session_type, verdict.is_granted(), true);
    verdict
}
