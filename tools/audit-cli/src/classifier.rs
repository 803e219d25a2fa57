use crate::runner::ExecutionResult;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Pass,
    Warning,
    Fail,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "Pass",
            Status::Warning => "Warning",
            Status::Fail => "Fail",
            Status::Unknown => "Unknown",
        }
    }
}

/// Normalized classification of one check's raw result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub check_name: String,
    pub status: Status,
    pub message: String,
    pub issue_count: Option<u32>,
}

// Marker patterns, one named constant per signal. Swapping a checker's
// output format means touching exactly one of these.
const BANDIT_ISSUE: &str = ">> Issue:";
const BANDIT_HIGH_SEVERITY: &str = "Severity: High";
const FLAKE8_VIOLATION: &str = r"(?m)^[^:\s]+:\d+:\d+:";
const MYPY_ERROR: &str = ": error:";
const BLACK_WOULD_REFORMAT: &str = "would reformat";
const ISORT_INCORRECT: &str = "Imports are incorrectly sorted";
const TALLY_PASSED: &str = r"(\d+) passed";
const TALLY_FAILED: &str = r"(\d+) failed";
const TALLY_ERROR: &str = r"(\d+) error";

#[derive(Debug, Clone, Copy)]
enum Marker {
    Literal(&'static str),
    Pattern(&'static str),
}

impl Marker {
    fn count(&self, text: &str) -> u32 {
        match self {
            Marker::Literal(needle) => text.matches(needle).count() as u32,
            Marker::Pattern(pattern) => Regex::new(pattern)
                .map(|re| re.find_iter(text).count() as u32)
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    /// One discrete finding per marker occurrence, compared against the
    /// configured threshold. The secondary marker only enriches the message.
    Threshold {
        marker: Marker,
        secondary: Option<(Marker, &'static str)>,
    },
    /// The check's own exit status is authoritative; output is only
    /// consulted for a "would change" marker.
    Binary { marker: &'static str },
    /// Test-runner style passed/failed/error tallies.
    Tally,
}

fn strategy_for(kind: &str) -> Option<Strategy> {
    match kind {
        "bandit" => Some(Strategy::Threshold {
            marker: Marker::Literal(BANDIT_ISSUE),
            secondary: Some((Marker::Literal(BANDIT_HIGH_SEVERITY), "high severity")),
        }),
        "flake8" => Some(Strategy::Threshold {
            marker: Marker::Pattern(FLAKE8_VIOLATION),
            secondary: None,
        }),
        "mypy" => Some(Strategy::Threshold {
            marker: Marker::Literal(MYPY_ERROR),
            secondary: None,
        }),
        "black" => Some(Strategy::Binary {
            marker: BLACK_WOULD_REFORMAT,
        }),
        "isort" => Some(Strategy::Binary {
            marker: ISORT_INCORRECT,
        }),
        "pytest" => Some(Strategy::Tally),
        _ => None,
    }
}

/// Turn a raw execution result into a normalized outcome. Deterministic:
/// identical (kind, result, threshold) always classifies identically.
pub fn classify(kind: &str, result: &ExecutionResult, issue_threshold: u32) -> CheckOutcome {
    let check_name = result.check_name.clone();

    let Some(strategy) = strategy_for(kind) else {
        return CheckOutcome {
            check_name,
            status: Status::Unknown,
            message: format!("classification not implemented for {kind}"),
            issue_count: None,
        };
    };

    if result.exit_status != 0 && result.raw_output.trim().is_empty() {
        return CheckOutcome {
            check_name,
            status: Status::Fail,
            message: "check failed, no output".to_string(),
            issue_count: None,
        };
    }

    match strategy {
        Strategy::Threshold { marker, secondary } => {
            classify_threshold(check_name, result, issue_threshold, marker, secondary)
        }
        Strategy::Binary { marker } => classify_binary(check_name, result, marker),
        Strategy::Tally => classify_tally(check_name, result),
    }
}

fn classify_threshold(
    check_name: String,
    result: &ExecutionResult,
    threshold: u32,
    marker: Marker,
    secondary: Option<(Marker, &'static str)>,
) -> CheckOutcome {
    let count = marker.count(&result.raw_output);
    if count == 0 {
        return CheckOutcome {
            check_name,
            status: Status::Pass,
            message: "no issues found".to_string(),
            issue_count: Some(0),
        };
    }

    // Inclusive boundary: count == threshold is still a Warning.
    let (status, mut message) = if count <= threshold {
        (Status::Warning, format!("found {count} issues"))
    } else {
        (
            Status::Fail,
            format!("found {count} issues (expected \u{2264}{threshold})"),
        )
    };

    if let Some((sub_marker, label)) = secondary {
        let sub_count = sub_marker.count(&result.raw_output);
        if sub_count > 0 {
            message.push_str(&format!(", {sub_count} {label}"));
        }
    }

    CheckOutcome {
        check_name,
        status,
        message,
        issue_count: Some(count),
    }
}

fn classify_binary(check_name: String, result: &ExecutionResult, marker: &str) -> CheckOutcome {
    if result.exit_status == 0 {
        return CheckOutcome {
            check_name,
            status: Status::Pass,
            message: "no changes needed".to_string(),
            issue_count: Some(0),
        };
    }

    match change_count(marker, &result.raw_output) {
        Some(count) => CheckOutcome {
            check_name,
            status: Status::Warning,
            message: format!("would change {count} files"),
            issue_count: Some(count),
        },
        None => CheckOutcome {
            check_name,
            status: Status::Fail,
            message: "check failed".to_string(),
            issue_count: None,
        },
    }
}

/// How many files the tool would touch. Prefers an explicit count right
/// after the marker ("would reformat 2 files"), otherwise counts the
/// per-file marker lines.
fn change_count(marker: &str, output: &str) -> Option<u32> {
    if !output.contains(marker) {
        return None;
    }
    let pattern = format!(r"{} (\d+)", regex::escape(marker));
    if let Ok(re) = Regex::new(&pattern) {
        if let Some(captures) = re.captures(output) {
            if let Ok(count) = captures[1].parse() {
                return Some(count);
            }
        }
    }
    Some(output.matches(marker).count() as u32)
}

fn classify_tally(check_name: String, result: &ExecutionResult) -> CheckOutcome {
    let passed = extract_tally(TALLY_PASSED, &result.raw_output);
    let failed = extract_tally(TALLY_FAILED, &result.raw_output);
    let errors = extract_tally(TALLY_ERROR, &result.raw_output);

    if result.exit_status == 0 {
        return CheckOutcome {
            check_name,
            status: Status::Pass,
            message: format!("{} passed", passed.unwrap_or(0)),
            issue_count: Some(0),
        };
    }

    if failed.is_none() && errors.is_none() {
        return CheckOutcome {
            check_name,
            status: Status::Fail,
            message: "could not parse output".to_string(),
            issue_count: None,
        };
    }

    let failed = failed.unwrap_or(0);
    let errors = errors.unwrap_or(0);
    let message = if failed > 0 && errors > 0 {
        format!("{failed} failed, {errors} error(s)")
    } else if errors > 0 {
        format!("{errors} error(s)")
    } else {
        format!("{failed} failed")
    };

    CheckOutcome {
        check_name,
        status: Status::Fail,
        message,
        issue_count: Some(failed + errors),
    }
}

fn extract_tally(pattern: &str, output: &str) -> Option<u32> {
    let re = Regex::new(pattern).ok()?;
    let captures = re.captures(output)?;
    captures[1].parse().ok()
}
