use crate::error::AuditError;
use crate::runner::{CommandCall, CommandRunner};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scan target resolved to a local directory before the core sees it.
/// Cloned checkouts live in a temp dir that is removed when the value is
/// dropped, so it must outlive the run.
#[derive(Debug)]
pub enum ResolvedTarget {
    Local(PathBuf),
    Cloned { checkout: TempDir },
}

impl ResolvedTarget {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedTarget::Local(path) => path,
            ResolvedTarget::Cloned { checkout } => checkout.path(),
        }
    }
}

pub fn looks_like_git_url(spec: &str) -> bool {
    spec.starts_with("http://")
        || spec.starts_with("https://")
        || spec.starts_with("git@")
        || spec.ends_with(".git")
}

/// Turn a scan argument into an auditable directory: git URLs are
/// shallow-cloned into a temp checkout, directories are used as-is, and a
/// single file audits its parent directory.
pub fn resolve(spec: &str, runner: &dyn CommandRunner) -> Result<ResolvedTarget, AuditError> {
    if looks_like_git_url(spec) {
        return clone_into_tempdir(spec, runner);
    }

    let path = PathBuf::from(spec);
    if path.is_dir() {
        Ok(ResolvedTarget::Local(path))
    } else if path.is_file() {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok(ResolvedTarget::Local(parent.to_path_buf()))
    } else {
        Err(AuditError::Target {
            target: spec.to_string(),
            reason: "no such file or directory".to_string(),
        })
    }
}

fn clone_into_tempdir(url: &str, runner: &dyn CommandRunner) -> Result<ResolvedTarget, AuditError> {
    let checkout = TempDir::new().map_err(|error| AuditError::Target {
        target: url.to_string(),
        reason: format!("cannot create checkout dir: {error}"),
    })?;

    let call = CommandCall::new(
        "git",
        vec![
            "clone".to_string(),
            "--depth".to_string(),
            "1".to_string(),
            url.to_string(),
            checkout.path().display().to_string(),
        ],
    );

    let result = runner.run(&call).map_err(|error| AuditError::Target {
        target: url.to_string(),
        reason: error.to_string(),
    })?;

    if !result.success() {
        return Err(AuditError::Target {
            target: url.to_string(),
            reason: format!("git clone exited with status {}", result.status),
        });
    }

    Ok(ResolvedTarget::Cloned { checkout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandResult, LaunchError};
    use std::cell::RefCell;
    use std::fs;

    struct RecordingRunner {
        status: i32,
        calls: RefCell<Vec<CommandCall>>,
    }

    impl RecordingRunner {
        fn new(status: i32) -> Self {
            Self {
                status,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, call: &CommandCall) -> Result<CommandResult, LaunchError> {
            self.calls.borrow_mut().push(call.clone());
            Ok(CommandResult {
                status: self.status,
                output: String::new(),
            })
        }
    }

    #[test]
    fn git_urls_are_recognized() {
        assert!(looks_like_git_url("https://example.com/repo"));
        assert!(looks_like_git_url("http://example.com/repo"));
        assert!(looks_like_git_url("git@example.com:user/repo.git"));
        assert!(looks_like_git_url("user/repo.git"));
        assert!(!looks_like_git_url("src/project"));
        assert!(!looks_like_git_url("app.py"));
    }

    #[test]
    fn directory_resolves_to_itself() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new(0);
        let resolved = resolve(dir.path().to_str().unwrap(), &runner).unwrap();
        assert_eq!(resolved.path(), dir.path());
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn file_resolves_to_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.py");
        fs::write(&file, "print('hi')\n").unwrap();
        let runner = RecordingRunner::new(0);
        let resolved = resolve(file.to_str().unwrap(), &runner).unwrap();
        assert_eq!(resolved.path(), dir.path());
    }

    #[test]
    fn missing_path_is_an_error() {
        let runner = RecordingRunner::new(0);
        let error = resolve("/no/such/path/anywhere", &runner).unwrap_err();
        assert!(matches!(error, AuditError::Target { .. }));
    }

    #[test]
    fn url_triggers_a_shallow_clone() {
        let runner = RecordingRunner::new(0);
        let resolved = resolve("https://example.com/user/repo.git", &runner).unwrap();
        assert!(resolved.path().is_dir());

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args[0], "clone");
        assert_eq!(calls[0].args[1], "--depth");
        assert_eq!(calls[0].args[2], "1");
        assert_eq!(calls[0].args[3], "https://example.com/user/repo.git");
    }

    #[test]
    fn failed_clone_surfaces_the_exit_status() {
        let runner = RecordingRunner::new(128);
        let error = resolve("https://example.com/user/repo.git", &runner).unwrap_err();
        assert!(error.to_string().contains("status 128"));
    }
}
