use crate::aggregator::Aggregator;
use crate::classifier::{CheckOutcome, Status};
use crate::environment::EnvironmentInfo;
use crate::error::AuditError;
use chrono::Local;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

/// Detail blocks quote at most this many lines of raw output.
pub const EXCERPT_MAX_LINES: usize = 40;

/// Per-check detail kept for the report after the transient
/// `ExecutionResult` is discarded: timing plus a bounded output excerpt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckRecord {
    pub check_name: String,
    pub duration_ms: u64,
    pub excerpt: Vec<String>,
    pub omitted_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    pub duration_ms: u64,
    pub excerpt: Vec<String>,
    pub omitted_lines: usize,
}

/// Final state of one run, immutable after creation; rendered to Markdown
/// and serialized to a JSON sidecar.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub target: String,
    pub environment: EnvironmentInfo,
    pub entries: Vec<ReportEntry>,
    pub total_issues: u32,
}

impl RunReport {
    pub fn build(
        aggregator: &Aggregator,
        records: &[CheckRecord],
        environment: EnvironmentInfo,
        target: &Path,
    ) -> Self {
        let entries = aggregator
            .ordered_outcomes()
            .into_iter()
            .map(|outcome| {
                let record = records
                    .iter()
                    .find(|record| record.check_name == outcome.check_name);
                ReportEntry {
                    outcome: outcome.clone(),
                    duration_ms: record.map(|r| r.duration_ms).unwrap_or(0),
                    excerpt: record.map(|r| r.excerpt.clone()).unwrap_or_default(),
                    omitted_lines: record.map(|r| r.omitted_lines).unwrap_or(0),
                }
            })
            .collect();

        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            target: target.display().to_string(),
            environment,
            entries,
            total_issues: aggregator.total_issues(),
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.status == status)
            .count()
    }
}

/// Bound raw output for a detail block: up to `EXCERPT_MAX_LINES` lines
/// plus the number left out.
pub fn excerpt(raw_output: &str) -> (Vec<String>, usize) {
    let lines: Vec<String> = raw_output.lines().map(str::to_string).collect();
    if lines.len() <= EXCERPT_MAX_LINES {
        (lines, 0)
    } else {
        let omitted = lines.len() - EXCERPT_MAX_LINES;
        (lines[..EXCERPT_MAX_LINES].to_vec(), omitted)
    }
}

/// Render the persisted document. Section order is fixed: metadata,
/// summary table, non-Pass detail blocks, tool versions, totals,
/// recommendations.
pub fn render_markdown(report: &RunReport) -> String {
    let mut doc = String::new();

    writeln!(doc, "# Code Audit Report").ok();
    writeln!(doc).ok();
    writeln!(doc, "- Generated: {}", report.generated_at).ok();
    writeln!(doc, "- Target: {}", report.target).ok();
    writeln!(doc, "- Environment: {}", report.environment.describe()).ok();
    writeln!(doc).ok();

    writeln!(doc, "## Summary").ok();
    writeln!(doc).ok();
    writeln!(doc, "| Check | Status | Detail |").ok();
    writeln!(doc, "| --- | --- | --- |").ok();
    for entry in &report.entries {
        writeln!(
            doc,
            "| {} | {} | {} |",
            entry.outcome.check_name,
            entry.outcome.status.as_str(),
            entry.outcome.message,
        )
        .ok();
    }
    writeln!(doc).ok();

    let non_pass: Vec<&ReportEntry> = report
        .entries
        .iter()
        .filter(|entry| entry.outcome.status != Status::Pass)
        .collect();
    if !non_pass.is_empty() {
        writeln!(doc, "## Details").ok();
        writeln!(doc).ok();
        for entry in non_pass {
            writeln!(
                doc,
                "### {} \u{2014} {}",
                entry.outcome.check_name,
                entry.outcome.status.as_str()
            )
            .ok();
            writeln!(doc).ok();
            writeln!(doc, "```text").ok();
            for line in &entry.excerpt {
                writeln!(doc, "{line}").ok();
            }
            writeln!(doc, "```").ok();
            if entry.omitted_lines > 0 {
                writeln!(doc).ok();
                writeln!(doc, "...and {} more lines", entry.omitted_lines).ok();
            }
            writeln!(doc).ok();
        }
    }

    writeln!(doc, "## Tool Versions").ok();
    writeln!(doc).ok();
    for tool in &report.environment.tools {
        match &tool.version {
            Some(version) => writeln!(doc, "- {} {}", tool.name, version).ok(),
            None => writeln!(doc, "- {} (not found)", tool.name).ok(),
        };
    }
    writeln!(doc).ok();

    writeln!(doc, "## Totals").ok();
    writeln!(doc).ok();
    writeln!(
        doc,
        "{} issue(s) across {} check(s).",
        report.total_issues,
        report.entries.len()
    )
    .ok();
    writeln!(doc).ok();

    writeln!(doc, "## Recommendations").ok();
    writeln!(doc).ok();
    if report.total_issues == 0 {
        writeln!(
            doc,
            "No issues found. Keep this audit in your pre-merge workflow \
             so regressions surface as soon as they land."
        )
        .ok();
    } else {
        writeln!(doc, "- Address Fail checks first; Warnings are within threshold but should not accumulate.").ok();
        writeln!(doc, "- Run `pyaudit fix` to auto-correct formatting and import ordering.").ok();
        writeln!(doc, "- Re-run `pyaudit automated` after fixes to confirm a clean report.").ok();
    }

    doc
}

/// Persist the Markdown document plus a JSON sidecar next to it. The only
/// fatal failure after checks have run.
pub fn write_report(report: &RunReport, path: &Path) -> Result<(), AuditError> {
    let markdown = render_markdown(report);
    fs::write(path, markdown).map_err(|source| AuditError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;

    let json_path = path.with_extension("json");
    let json = serde_json::to_string_pretty(report)
        .map_err(|error| io::Error::new(io::ErrorKind::Other, error.to_string()))
        .and_then(|text| fs::write(&json_path, text));
    json.map_err(|source| AuditError::ReportWrite {
        path: json_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ToolVersion;

    fn outcome(name: &str, status: Status, message: &str, issues: Option<u32>) -> CheckOutcome {
        CheckOutcome {
            check_name: name.to_string(),
            status,
            message: message.to_string(),
            issue_count: issues,
        }
    }

    fn environment() -> EnvironmentInfo {
        EnvironmentInfo {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            python: Some("3.12.1".to_string()),
            tools: vec![
                ToolVersion {
                    name: "bandit".to_string(),
                    version: Some("1.7.5".to_string()),
                },
                ToolVersion {
                    name: "flake8".to_string(),
                    version: None,
                },
            ],
        }
    }

    fn sample_report(total_issues: u32) -> RunReport {
        RunReport {
            generated_at: "2026-08-30 12:00:00".to_string(),
            target: "/tmp/project".to_string(),
            environment: environment(),
            entries: vec![
                ReportEntry {
                    outcome: outcome("security", Status::Pass, "no issues found", Some(0)),
                    duration_ms: 420,
                    excerpt: vec![],
                    omitted_lines: 0,
                },
                ReportEntry {
                    outcome: outcome(
                        "style",
                        Status::Fail,
                        "found 7 issues (expected \u{2264}5)",
                        Some(7),
                    ),
                    duration_ms: 900,
                    excerpt: vec!["app.py:1:1: E302".to_string()],
                    omitted_lines: 12,
                },
            ],
            total_issues,
        }
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let doc = render_markdown(&sample_report(7));
        let metadata = doc.find("- Generated:").unwrap();
        let summary = doc.find("## Summary").unwrap();
        let details = doc.find("## Details").unwrap();
        let versions = doc.find("## Tool Versions").unwrap();
        let totals = doc.find("## Totals").unwrap();
        let recommendations = doc.find("## Recommendations").unwrap();
        assert!(metadata < summary);
        assert!(summary < details);
        assert!(details < versions);
        assert!(versions < totals);
        assert!(totals < recommendations);
    }

    #[test]
    fn summary_has_one_row_per_outcome_in_order() {
        let doc = render_markdown(&sample_report(7));
        let security = doc.find("| security | Pass |").unwrap();
        let style = doc.find("| style | Fail |").unwrap();
        assert!(security < style);
    }

    #[test]
    fn details_cover_non_pass_outcomes_only() {
        let doc = render_markdown(&sample_report(7));
        assert!(doc.contains("### style \u{2014} Fail"));
        assert!(!doc.contains("### security"));
    }

    #[test]
    fn truncation_marker_names_omitted_line_count() {
        let doc = render_markdown(&sample_report(7));
        assert!(doc.contains("...and 12 more lines"));
    }

    #[test]
    fn recommendations_branch_on_total_issues() {
        let clean = render_markdown(&sample_report(0));
        let dirty = render_markdown(&sample_report(7));
        assert!(clean.contains("No issues found."));
        assert!(!clean.contains("pyaudit fix"));
        assert!(dirty.contains("pyaudit fix"));
    }

    #[test]
    fn missing_tool_version_is_reported_as_not_found() {
        let doc = render_markdown(&sample_report(0));
        assert!(doc.contains("- bandit 1.7.5"));
        assert!(doc.contains("- flake8 (not found)"));
    }

    #[test]
    fn excerpt_keeps_short_output_whole() {
        let (lines, omitted) = excerpt("one\ntwo\nthree");
        assert_eq!(lines.len(), 3);
        assert_eq!(omitted, 0);
    }

    #[test]
    fn excerpt_bounds_long_output() {
        let raw = "line\n".repeat(EXCERPT_MAX_LINES + 25);
        let (lines, omitted) = excerpt(&raw);
        assert_eq!(lines.len(), EXCERPT_MAX_LINES);
        assert_eq!(omitted, 25);
    }

    #[test]
    fn write_report_persists_markdown_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit-report.md");
        write_report(&sample_report(7), &path).unwrap();

        let markdown = fs::read_to_string(&path).unwrap();
        assert!(markdown.contains("# Code Audit Report"));

        let json = fs::read_to_string(dir.path().join("audit-report.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["total_issues"], 7);
        assert_eq!(parsed["entries"][1]["status"], "Fail");
    }

    #[test]
    fn unwritable_path_is_a_report_write_error() {
        let error = write_report(
            &sample_report(0),
            Path::new("/nonexistent-dir/audit-report.md"),
        )
        .unwrap_err();
        assert!(matches!(error, AuditError::ReportWrite { .. }));
    }

    #[test]
    fn build_preserves_aggregator_order_and_totals() {
        let mut aggregator = Aggregator::new();
        aggregator.record(outcome("style", Status::Warning, "found 3 issues", Some(3)));
        aggregator.record(outcome("tests", Status::Pass, "5 passed", Some(0)));
        let records = vec![CheckRecord {
            check_name: "style".to_string(),
            duration_ms: 77,
            excerpt: vec!["app.py:1:1: E302".to_string()],
            omitted_lines: 0,
        }];

        let report = RunReport::build(
            &aggregator,
            &records,
            environment(),
            Path::new("/tmp/project"),
        );
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].outcome.check_name, "style");
        assert_eq!(report.entries[0].duration_ms, 77);
        assert_eq!(report.entries[1].duration_ms, 0);
        assert_eq!(report.total_issues, 3);
        assert_eq!(report.count(Status::Warning), 1);
    }
}
