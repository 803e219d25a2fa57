use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal orchestration errors. Per-check failures never appear here; they
/// are absorbed into a `CheckOutcome` and the run keeps going.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("config line {line}: {reason}")]
    Config { line: usize, reason: String },

    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("cannot write report to {}: {source}", path.display())]
    ReportWrite { path: PathBuf, source: io::Error },

    #[error("cannot resolve target '{target}': {reason}")]
    Target { target: String, reason: String },

    #[error("backup to {} failed: {source}", path.display())]
    Backup { path: PathBuf, source: io::Error },
}

impl AuditError {
    pub fn config(line: usize, reason: impl Into<String>) -> Self {
        Self::Config {
            line,
            reason: reason.into(),
        }
    }
}
