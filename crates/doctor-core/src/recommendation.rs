//! Remediation text for structural finding categories.
//!
//! The lookup is total: unknown categories get a generic recommendation.

/// Check categories emitted by the structural check runner.
pub mod checks {
    /// Record points at a memory that no longer exists.
    pub const ORPHANED_REFERENCE: &str = "orphaned_reference";
    /// Belief confidence below the runner's threshold.
    pub const LOW_CONFIDENCE_BELIEF: &str = "low_confidence_belief";
    /// Relationship not interacted with for a long time.
    pub const STALE_RELATIONSHIP: &str = "stale_relationship";
    /// Two beliefs assert opposing statements.
    pub const BELIEF_CONTRADICTION: &str = "belief_contradiction";
    /// Active goal with no recent progress.
    pub const STALE_GOAL: &str = "stale_goal";
}

/// Returned for categories without a dedicated recommendation.
pub const DEFAULT_RECOMMENDATION: &str = "Review finding and take appropriate action";

/// One-line remediation for a finding category.
pub fn recommendation_for(category: &str) -> &'static str {
    match category {
        checks::ORPHANED_REFERENCE => "Remove or update broken references",
        checks::LOW_CONFIDENCE_BELIEF => "Review and verify or archive low-confidence beliefs",
        checks::STALE_RELATIONSHIP => "Re-engage or archive stale relationships",
        checks::BELIEF_CONTRADICTION => "Review and resolve contradicting beliefs",
        checks::STALE_GOAL => "Review goal status -- complete, archive, or re-prioritize",
        _ => DEFAULT_RECOMMENDATION,
    }
}
