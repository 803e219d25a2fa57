use crate::runner::{CommandCall, CommandRunner};
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolVersion {
    pub name: String,
    pub version: Option<String>,
}

/// Descriptor of the machine and toolchain a run executed on; lands in the
/// report's metadata and tool-versions sections.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub os: String,
    pub arch: String,
    pub python: Option<String>,
    pub tools: Vec<ToolVersion>,
}

impl EnvironmentInfo {
    /// Probe the interpreter and every named checker for a version string.
    pub fn collect(runner: &dyn CommandRunner, programs: &[&str]) -> Self {
        let tools = programs
            .iter()
            .map(|program| ToolVersion {
                name: (*program).to_string(),
                version: probe_version(runner, program),
            })
            .collect();

        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            python: probe_version(runner, "python3"),
            tools,
        }
    }

    /// One-line descriptor for the report header.
    pub fn describe(&self) -> String {
        match &self.python {
            Some(version) => format!("{}/{}, Python {}", self.os, self.arch, version),
            None => format!("{}/{}", self.os, self.arch),
        }
    }
}

fn probe_version(runner: &dyn CommandRunner, program: &str) -> Option<String> {
    for flag in ["--version", "-V"] {
        let call = CommandCall::new(program, vec![flag.to_string()]);
        if let Ok(result) = runner.run(&call) {
            if let Some(version) = parse_version(&result.output) {
                return Some(version);
            }
        }
    }
    None
}

/// First version-shaped token in probe output ("1.7.5" or "24.2").
pub fn parse_version(output: &str) -> Option<String> {
    let re = Regex::new(r"\d+\.\d+(\.\d+)?").ok()?;
    re.find(output).map(|m| m.as_str().to_string())
}
