use crate::config::CheckDefinition;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandCall {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: i32,
    /// stdout and stderr merged; interleaving between the two streams is
    /// best-effort only.
    pub output: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// The subprocess could not even start (missing binary, bad permissions).
/// Distinct from a non-zero exit, which is recorded as data.
#[derive(Debug, Clone)]
pub struct LaunchError {
    pub program: String,
    pub message: String,
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not start '{}': {}", self.program, self.message)
    }
}

pub trait CommandRunner {
    fn run(&self, call: &CommandCall) -> Result<CommandResult, LaunchError>;
}

#[derive(Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, call: &CommandCall) -> Result<CommandResult, LaunchError> {
        let mut cmd = Command::new(&call.program);
        cmd.args(&call.args).stdin(Stdio::null());
        if let Some(dir) = call.current_dir.as_deref() {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|error| LaunchError {
            program: call.program.clone(),
            message: error.to_string(),
        })?;

        let mut merged = String::from_utf8_lossy(&output.stdout).into_owned();
        merged.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandResult {
            status: output.status.code().unwrap_or(1),
            output: merged,
        })
    }
}

/// Raw result of one check invocation. Transient: consumed by the
/// classifier immediately, never stored past the per-check step.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub check_name: String,
    pub raw_output: String,
    pub exit_status: i32,
    pub duration_ms: u64,
}

/// Run one check's invocation scoped to the target path. A non-zero exit
/// comes back as a normal `ExecutionResult`; only a launch failure is an
/// `Err`, and the caller turns that into a Fail outcome rather than
/// propagating it.
pub fn execute(
    def: &CheckDefinition,
    root: &Path,
    runner: &dyn CommandRunner,
) -> Result<ExecutionResult, LaunchError> {
    let mut parts = def.invocation.split_whitespace();
    let program = parts.next().ok_or_else(|| LaunchError {
        program: def.name.clone(),
        message: "empty invocation".to_string(),
    })?;

    let call = CommandCall {
        program: program.to_string(),
        args: parts.map(str::to_string).collect(),
        current_dir: Some(root.join(&def.target_path)),
    };

    let start = Instant::now();
    let result = runner.run(&call)?;
    Ok(ExecutionResult {
        check_name: def.name.clone(),
        raw_output: result.output,
        exit_status: result.status,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Check if a command is available on PATH.
pub fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
