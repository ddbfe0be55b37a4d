//! JSON views and plain-text rendering of sessions and reports.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccessLevel, DiagnosticReport, DiagnosticSession, ReportFinding, SessionStatus, SessionType,
    Severity,
};
use crate::session::SessionOutcome;

const RULE_WIDTH: usize = 55;
const SHORT_ID_LEN: usize = 12;

/// First 12 characters of an id, for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Output of a successful session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStartView {
    pub session_id: String,
    pub report_id: String,
    pub session_type: SessionType,
    pub access_level: AccessLevel,
    pub summary: String,
    pub findings: Vec<ReportFinding>,
}

impl From<&SessionOutcome> for SessionStartView {
    fn from(outcome: &SessionOutcome) -> Self {
        Self {
            session_id: outcome.session.id.0.clone(),
            report_id: outcome.report.id.0.clone(),
            session_type: outcome.session.session_type,
            access_level: outcome.session.access_level,
            summary: outcome.report.summary.clone(),
            findings: outcome.report.findings.clone(),
        }
    }
}

/// One row of the session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionListEntry {
    pub id: String,
    pub session_type: SessionType,
    pub access_level: AccessLevel,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&DiagnosticSession> for SessionListEntry {
    fn from(s: &DiagnosticSession) -> Self {
        Self {
            id: s.id.0.clone(),
            session_type: s.session_type,
            access_level: s.access_level,
            status: s.status,
            started_at: s.started_at,
            completed_at: s.completed_at,
        }
    }
}

/// A stored report as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportView {
    pub id: String,
    pub session_id: String,
    pub summary: String,
    pub findings: Vec<ReportFinding>,
    pub created_at: DateTime<Utc>,
}

impl From<&DiagnosticReport> for ReportView {
    fn from(r: &DiagnosticReport) -> Self {
        Self {
            id: r.id.0.clone(),
            session_id: r.session_id.0.clone(),
            summary: r.summary.clone(),
            findings: r.findings.clone(),
            created_at: r.created_at,
        }
    }
}

/// Write a report view as pretty JSON.
pub fn write_report_json(path: &Path, view: &ReportView) -> Result<()> {
    let content = serde_json::to_string_pretty(view).context("serialize report view")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

fn status_badge(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "[active]",
        SessionStatus::Completed => "[done]  ",
        SessionStatus::Cancelled => "[cancel]",
    }
}

fn push_banner(out: &mut String, title: &str, stack_id: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    out.push('\n');
    out.push_str(&format!("{rule}\n  Diagnostic {title}\n{rule}\n"));
    out.push_str(&format!("  Stack: {stack_id}\n"));
}

fn push_findings(out: &mut String, findings: &[ReportFinding], healthy_line: &str) {
    if findings.is_empty() {
        out.push_str(&format!("  {healthy_line}\n"));
        return;
    }

    let rule = "-".repeat(RULE_WIDTH);
    for (severity, heading) in [
        (Severity::Error, "ERRORS"),
        (Severity::Warning, "WARNINGS"),
        (Severity::Info, "INFO"),
    ] {
        let section: Vec<&ReportFinding> =
            findings.iter().filter(|f| f.severity == severity).collect();
        if section.is_empty() {
            continue;
        }
        out.push_str(&format!("{rule}\n{heading}\n{rule}\n"));
        for f in section {
            // Tags padded to a common width.
            out.push_str(&format!("  {:<10}{}\n", format!("[{}]", f.severity), f.description));
            if severity != Severity::Info {
                out.push_str(&format!("           -> {}\n", f.recommendation));
            }
        }
        out.push('\n');
    }
}

/// Text rendering of a freshly completed session.
pub fn render_session_text(stack_id: &str, outcome: &SessionOutcome) -> String {
    let mut out = String::new();
    push_banner(&mut out, "Session", stack_id);
    out.push_str(&format!("  Session: {}...\n", short_id(outcome.session.id.as_str())));
    out.push_str(&format!("  Type: {}\n", outcome.session.session_type));
    out.push_str(&format!("  Access: {}\n\n", outcome.session.access_level));
    out.push_str(&format!("  {}\n\n", outcome.report.summary));
    push_findings(
        &mut out,
        &outcome.report.findings,
        "All structural checks passed. Memory graph is healthy.",
    );
    out.push_str(&format!(
        "  Report saved: {}...\n",
        short_id(outcome.report.id.as_str())
    ));
    out
}

/// Text rendering of a stored report.
pub fn render_report_text(stack_id: &str, report: &DiagnosticReport) -> String {
    let mut out = String::new();
    push_banner(&mut out, "Report", stack_id);
    out.push_str(&format!("  Report: {}...\n", short_id(report.id.as_str())));
    out.push_str(&format!("  Session: {}...\n", short_id(report.session_id.as_str())));
    out.push_str(&format!(
        "  Created: {}\n\n",
        report.created_at.format("%Y-%m-%d %H:%M")
    ));
    if !report.summary.is_empty() {
        out.push_str(&format!("  Summary: {}\n\n", report.summary));
    }
    push_findings(
        &mut out,
        &report.findings,
        "No findings -- memory graph is healthy.",
    );
    out
}

/// Text rendering of a session listing.
pub fn render_session_list(stack_id: &str, sessions: &[DiagnosticSession]) -> String {
    let mut out = String::new();
    push_banner(&mut out, "Sessions", stack_id);
    out.push('\n');

    if sessions.is_empty() {
        out.push_str("  No diagnostic sessions found.\n");
        out.push_str("  Start one with a self_requested session.\n");
        return out;
    }

    for s in sessions {
        out.push_str(&format!(
            "  {} {}...  {:<20}  {}\n",
            status_badge(s.status),
            short_id(s.id.as_str()),
            s.session_type.as_str(),
            s.started_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out.push('\n');
    out
}
