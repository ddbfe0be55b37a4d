//! Report compiler: raw structural findings → privacy-safe report body.
//!
//! The compiler sees nothing but the `StructuralFinding` slice it is handed.
//! Each output entry copies `severity`, `check` and the pre-rendered
//! `message`; `memory_type` and `memory_id` are dropped. Summaries are
//! computed from the output entries.

use serde::{Deserialize, Serialize};

use crate::domain::{ReportFinding, Severity, StructuralFinding};
use crate::recommendation::recommendation_for;

/// Summary used when a session produced no findings.
pub const HEALTHY_SUMMARY: &str = "No issues found. Memory graph is healthy.";

/// Findings plus their summary, ready to be persisted as a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledReport {
    pub findings: Vec<ReportFinding>,
    pub summary: String,
}

/// Finding counts per severity bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl SeverityCounts {
    pub fn tally(findings: &[ReportFinding]) -> Self {
        findings.iter().fold(Self::default(), |mut counts, f| {
            match f.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => counts.infos += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

/// Map one structural finding to its report entry.
pub fn to_report_finding(finding: &StructuralFinding) -> ReportFinding {
    ReportFinding {
        severity: finding.severity,
        category: finding.check.clone(),
        description: finding.message.clone(),
        recommendation: recommendation_for(&finding.check).to_string(),
    }
}

/// Human-readable summary of compiled findings.
///
/// Bucket order is error, warning, info; empty buckets are omitted. "info"
/// takes no plural suffix.
pub fn summarize(findings: &[ReportFinding]) -> String {
    let counts = SeverityCounts::tally(findings);
    if counts.total() == 0 {
        return HEALTHY_SUMMARY.to_string();
    }

    let mut parts = Vec::with_capacity(3);
    if counts.errors > 0 {
        parts.push(format!("{} error(s)", counts.errors));
    }
    if counts.warnings > 0 {
        parts.push(format!("{} warning(s)", counts.warnings));
    }
    if counts.infos > 0 {
        parts.push(format!("{} info", counts.infos));
    }
    format!("Found {} finding(s): {}", counts.total(), parts.join(", "))
}

/// Compile raw findings into report entries and a summary, preserving order.
pub fn compile_report(findings: &[StructuralFinding]) -> CompiledReport {
    let findings: Vec<ReportFinding> = findings.iter().map(to_report_finding).collect();
    let summary = summarize(&findings);
    CompiledReport { findings, summary }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(severity: Severity) -> ReportFinding {
        ReportFinding {
            severity,
            category: "c".into(),
            description: "d".into(),
            recommendation: "r".into(),
        }
    }

    #[test]
    fn maps_fields_and_preserves_order() {
        let input = vec![
            StructuralFinding::new(
                "orphaned_reference",
                Severity::Error,
                "episode",
                "abc-123",
                "Episode #abc has broken ref",
            ),
            StructuralFinding::new(
                "low_confidence_belief",
                Severity::Warning,
                "belief",
                "def-456",
                "Belief #def has low confidence",
            ),
        ];

        let compiled = compile_report(&input);
        assert_eq!(compiled.findings.len(), 2);
        assert_eq!(compiled.findings[0].severity, Severity::Error);
        assert_eq!(compiled.findings[0].category, "orphaned_reference");
        assert!(compiled.findings[0].description.contains("broken ref"));
        assert_eq!(
            compiled.findings[0].recommendation,
            "Remove or update broken references"
        );
        assert_eq!(compiled.findings[1].severity, Severity::Warning);
        assert_eq!(compiled.findings[1].category, "low_confidence_belief");
    }

    #[test]
    fn empty_input_is_healthy() {
        let compiled = compile_report(&[]);
        assert!(compiled.findings.is_empty());
        assert_eq!(compiled.summary, HEALTHY_SUMMARY);
        assert!(compiled.summary.to_lowercase().contains("healthy"));
    }

    #[test]
    fn summary_exact_format() {
        let findings = vec![
            entry(Severity::Error),
            entry(Severity::Warning),
            entry(Severity::Warning),
            entry(Severity::Info),
        ];
        assert_eq!(
            summarize(&findings),
            "Found 4 finding(s): 1 error(s), 2 warning(s), 1 info"
        );
    }

    #[test]
    fn summary_omits_empty_buckets() {
        let findings = vec![entry(Severity::Info), entry(Severity::Info)];
        assert_eq!(summarize(&findings), "Found 2 finding(s): 2 info");

        let findings = vec![entry(Severity::Warning), entry(Severity::Error)];
        assert_eq!(
            summarize(&findings),
            "Found 2 finding(s): 1 error(s), 1 warning(s)"
        );
    }

    #[test]
    fn compiled_report_drops_memory_locators() {
        let input = vec![StructuralFinding::new(
            "low_confidence_belief",
            Severity::Warning,
            "belief-type-marker",
            "locator-7f3a",
            "Belief (confidence 0.20) -- low confidence",
        )];
        let json = serde_json::to_string(&compile_report(&input)).unwrap();
        assert!(!json.contains("locator-7f3a"));
        assert!(!json.contains("belief-type-marker"));
    }

    #[test]
    fn tally_counts_each_bucket() {
        let counts = SeverityCounts::tally(&[
            entry(Severity::Error),
            entry(Severity::Error),
            entry(Severity::Info),
        ]);
        assert_eq!(
            counts,
            SeverityCounts {
                errors: 2,
                warnings: 0,
                infos: 1
            }
        );
        assert_eq!(counts.total(), 3);
    }
}
