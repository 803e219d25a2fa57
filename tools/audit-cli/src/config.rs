use crate::error::AuditError;
use std::fs;
use std::path::Path;

/// One configured external check plus its interpretation parameters.
/// Immutable once loaded; one registry per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDefinition {
    pub name: String,
    pub invocation: String,
    pub target_path: String,
    pub issue_threshold: u32,
    pub description: String,
}

impl CheckDefinition {
    /// Basename of the invocation's program; the classifier dispatches on
    /// this, so the `name` field stays a free-form label.
    pub fn kind(&self) -> &str {
        let program = self.invocation.split_whitespace().next().unwrap_or("");
        program.rsplit('/').next().unwrap_or(program)
    }
}

/// Built-in registry for the Python checker suite. Overridable with
/// `--config FILE`, same record format.
pub const DEFAULT_CHECKS: &str = "\
# name|invocation|target_path|issue_threshold|description
security|bandit -r . -q|.|2|Security issues flagged by bandit
style|flake8 .|.|5|Style and lint violations from flake8
types|mypy .|.|3|Static type errors from mypy
format|black --check .|.|0|Formatting drift detected by black
imports|isort --check-only .|.|0|Import ordering drift detected by isort
tests|pytest -q|.|0|Unit test suite via pytest
";

pub fn load_registry_file(path: &Path) -> Result<Vec<CheckDefinition>, AuditError> {
    let text = fs::read_to_string(path).map_err(|source| AuditError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    load_registry(&text)
}

/// Parse pipe-delimited records (one per line, five fields) into an ordered
/// registry. Blank lines and `#` comments are skipped. Any malformed record
/// aborts the load before a single check runs.
pub fn load_registry(text: &str) -> Result<Vec<CheckDefinition>, AuditError> {
    let mut registry: Vec<CheckDefinition> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split('|').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(AuditError::config(
                line,
                format!("expected 5 pipe-delimited fields, got {}", fields.len()),
            ));
        }

        let name = fields[0];
        if name.is_empty() {
            return Err(AuditError::config(line, "check name is empty"));
        }
        if registry.iter().any(|def| def.name == name) {
            return Err(AuditError::config(
                line,
                format!("duplicate check name '{name}'"),
            ));
        }

        let issue_threshold: u32 = fields[3].parse().map_err(|_| {
            AuditError::config(
                line,
                format!("issue threshold '{}' is not a non-negative integer", fields[3]),
            )
        })?;

        registry.push(CheckDefinition {
            name: name.to_string(),
            invocation: fields[1].to_string(),
            target_path: fields[2].to_string(),
            issue_threshold,
            description: fields[4].to_string(),
        });
    }

    Ok(registry)
}
