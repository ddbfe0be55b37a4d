//! Trust subsystem data as seen by the consent gate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Principal whose trust gates operator-initiated sessions.
pub const STACK_OWNER: &str = "stack-owner";

/// Action label queried for diagnostic access.
pub const DIAGNOSTIC_ACTION: &str = "diagnostic";

/// Answer from the trust subsystem for one (entity, action) query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl TrustDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// A scope the entity has been granted authority over ("all" or an action).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityGrant {
    pub scope: String,
}

impl AuthorityGrant {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    pub fn covers(&self, action: &str) -> bool {
        self.scope == "all" || self.scope == action
    }
}

/// Per-entity trust profile. Owned by the trust subsystem; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustAssessment {
    pub entity: String,
    /// Named dimensions ("general", "diagnostic", ...) to scores in [0, 1].
    pub dimensions: BTreeMap<String, f64>,
    pub authority: Vec<AuthorityGrant>,
    pub created_at: DateTime<Utc>,
}

impl TrustAssessment {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            dimensions: BTreeMap::new(),
            authority: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_dimension(mut self, name: impl Into<String>, score: f64) -> Self {
        self.dimensions.insert(name.into(), score);
        self
    }

    pub fn with_authority(mut self, scope: impl Into<String>) -> Self {
        self.authority.push(AuthorityGrant::new(scope));
        self
    }

    /// Score for `action` if that dimension exists, else "general".
    pub fn score_for(&self, action: &str) -> Option<f64> {
        self.dimensions
            .get(action)
            .or_else(|| self.dimensions.get("general"))
            .copied()
    }

    pub fn grants(&self, action: &str) -> bool {
        self.authority.iter().any(|g| g.covers(action))
    }
}
