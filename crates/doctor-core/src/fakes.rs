//! In-memory fakes for the engine's collaborator ports (testing only)
//!
//! - `ScriptedChecker` / `FailingChecker` for `StructuralChecker`
//! - `BeliefGraphChecker`: a tiny belief graph with private statement text,
//!   flagging low-confidence beliefs by id and score
//! - `MemoryTrustAuthority` / `FailingTrustAuthority` for `TrustAuthority`
//!
//! Every fake counts its calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    CheckContext, Severity, StructuralFinding, TrustAssessment, TrustDecision,
};
use crate::ports::{StructuralChecker, TrustAuthority};
use crate::recommendation::checks;

// ---------------------------------------------------------------------------
// Structural checkers
// ---------------------------------------------------------------------------

/// Returns a fixed list of findings on every run.
#[derive(Debug, Default)]
pub struct ScriptedChecker {
    findings: Vec<StructuralFinding>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    contexts: Mutex<Vec<CheckContext>>,
}

impl ScriptedChecker {
    pub fn new(findings: Vec<StructuralFinding>) -> Self {
        Self {
            findings,
            ..Self::default()
        }
    }

    /// A checker that finds nothing.
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Sleep before answering, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Contexts seen so far, oldest first.
    pub fn contexts(&self) -> Vec<CheckContext> {
        self.contexts
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StructuralChecker for ScriptedChecker {
    async fn run(&self, ctx: &CheckContext) -> anyhow::Result<Vec<StructuralFinding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.contexts.lock() {
            seen.push(ctx.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.findings.clone())
    }
}

/// Always errors.
#[derive(Debug)]
pub struct FailingChecker {
    message: String,
    calls: AtomicUsize,
}

impl FailingChecker {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuralChecker for FailingChecker {
    async fn run(&self, _ctx: &CheckContext) -> anyhow::Result<Vec<StructuralFinding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("{}", self.message)
    }
}

/// A belief record. `statement` is memory content and must never be reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Belief {
    pub id: String,
    pub statement: String,
    pub confidence: f64,
}

impl Belief {
    pub fn new(id: impl Into<String>, statement: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: id.into(),
            statement: statement.into(),
            confidence,
        }
    }
}

/// Flags beliefs whose confidence is below a threshold.
///
/// Messages are built from the belief id and its score only.
#[derive(Debug, Clone)]
pub struct BeliefGraphChecker {
    beliefs: Vec<Belief>,
    threshold: f64,
}

impl BeliefGraphChecker {
    pub const DEFAULT_THRESHOLD: f64 = 0.3;

    pub fn new(beliefs: Vec<Belief>) -> Self {
        Self {
            beliefs,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl StructuralChecker for BeliefGraphChecker {
    async fn run(&self, _ctx: &CheckContext) -> anyhow::Result<Vec<StructuralFinding>> {
        Ok(self
            .beliefs
            .iter()
            .filter(|b| b.confidence < self.threshold)
            .map(|b| {
                StructuralFinding::new(
                    checks::LOW_CONFIDENCE_BELIEF,
                    Severity::Warning,
                    "belief",
                    b.id.clone(),
                    format!(
                        "Belief #{} (confidence {:.2}) -- low confidence",
                        crate::reporting::short_id(&b.id),
                        b.confidence
                    ),
                )
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Trust authorities
// ---------------------------------------------------------------------------

/// Trust authority over seeded assessments.
///
/// Allows iff the entity has an assessment, an authority grant covering the
/// action, and a score for the action (else its "general" score) at or above
/// `min_score`.
#[derive(Debug)]
pub struct MemoryTrustAuthority {
    assessments: Mutex<HashMap<String, TrustAssessment>>,
    min_score: f64,
    calls: AtomicUsize,
}

impl Default for MemoryTrustAuthority {
    fn default() -> Self {
        Self {
            assessments: Mutex::new(HashMap::new()),
            min_score: Self::DEFAULT_MIN_SCORE,
            calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryTrustAuthority {
    pub const DEFAULT_MIN_SCORE: f64 = 0.5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assessment(self, assessment: TrustAssessment) -> Self {
        self.insert(assessment);
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Replace the assessment for `assessment.entity`.
    pub fn insert(&self, assessment: TrustAssessment) {
        if let Ok(mut map) = self.assessments.lock() {
            map.insert(assessment.entity.clone(), assessment);
        }
    }

    /// Drop any assessment for `entity`.
    pub fn revoke(&self, entity: &str) {
        if let Ok(mut map) = self.assessments.lock() {
            map.remove(entity);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrustAuthority for MemoryTrustAuthority {
    async fn authorize(&self, entity: &str, action: &str) -> anyhow::Result<TrustDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let map = self
            .assessments
            .lock()
            .map_err(|e| anyhow::anyhow!("trust store lock poisoned: {e}"))?;

        let Some(assessment) = map.get(entity) else {
            return Ok(TrustDecision::deny(format!("no trust assessment for '{entity}'")));
        };
        if !assessment.grants(action) {
            return Ok(TrustDecision::deny(format!(
                "'{entity}' has no authority for '{action}'"
            )));
        }
        match assessment.score_for(action) {
            Some(score) if score >= self.min_score => Ok(TrustDecision::allow()),
            Some(score) => Ok(TrustDecision::deny(format!(
                "trust score {score:.2} below threshold {:.2}",
                self.min_score
            ))),
            None => Ok(TrustDecision::deny(format!(
                "no trust score for '{entity}' on '{action}'"
            ))),
        }
    }
}

/// Always errors.
#[derive(Debug)]
pub struct FailingTrustAuthority {
    message: String,
    calls: AtomicUsize,
}

impl FailingTrustAuthority {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrustAuthority for FailingTrustAuthority {
    async fn authorize(&self, _entity: &str, _action: &str) -> anyhow::Result<TrustDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("{}", self.message)
    }
}
