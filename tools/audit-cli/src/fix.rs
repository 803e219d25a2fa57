use crate::error::AuditError;
use crate::runner::{CommandCall, CommandRunner};
use chrono::Local;
use crc32fast::Hasher;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Directories never touched by backup or fixers.
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    ".audit-backup",
];

/// Mutating invocations, run in order after the backup exists.
pub const FIXERS: &[(&str, &str)] = &[("black", "black ."), ("isort", "isort .")];

pub const BACKUP_DIR: &str = ".audit-backup";

/// Recursively collect .py files under the target, skipping tool caches.
pub fn collect_python_files(dir: &Path) -> Vec<PathBuf> {
    let skip: HashSet<&str> = SKIP_DIRS.iter().copied().collect();
    let mut results = Vec::new();
    collect_inner(dir, &skip, &mut results);
    results.sort();
    results
}

fn collect_inner(dir: &Path, skip: &HashSet<&str>, results: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if path.is_dir() {
                if !skip.contains(name) {
                    collect_inner(&path, skip, results);
                }
            } else if path.is_file() && name.ends_with(".py") {
                results.push(path);
            }
        }
    }
}

pub fn checksum_file(path: &Path) -> io::Result<u32> {
    let bytes = fs::read(path)?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize())
}

/// Copy every file into the backup root, preserving relative paths, and
/// verify each copy's checksum against its source. Must fully succeed
/// before the first mutating subprocess launches.
pub fn backup_files(root: &Path, files: &[PathBuf], backup_root: &Path) -> io::Result<()> {
    for file in files {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let dest = backup_root.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(file, &dest)?;
        if checksum_file(file)? != checksum_file(&dest)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("backup verification failed for {}", file.display()),
            ));
        }
    }
    Ok(())
}

pub fn confirm(input: &mut dyn BufRead, output: &mut dyn Write, count: usize) -> io::Result<bool> {
    write!(
        output,
        "About to rewrite {count} file(s) in place. A verified backup goes to \
         {BACKUP_DIR}/ first. Continue? [y/N] "
    )?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Fix mode: confirm, back up, then run the fixers. Returns the process
/// exit code; only a failed backup is a hard error.
pub fn run_fix(
    root: &Path,
    runner: &dyn CommandRunner,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<i32, AuditError> {
    let files = collect_python_files(root);
    if files.is_empty() {
        writeln!(output, "no Python files under {}", root.display()).ok();
        return Ok(0);
    }

    if !confirm(input, output, files.len()).unwrap_or(false) {
        writeln!(output, "aborted; nothing changed").ok();
        return Ok(0);
    }

    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let backup_root = root.join(BACKUP_DIR).join(stamp.to_string());
    backup_files(root, &files, &backup_root).map_err(|source| AuditError::Backup {
        path: backup_root.clone(),
        source,
    })?;
    writeln!(
        output,
        "backed up {} file(s) to {}",
        files.len(),
        backup_root.display()
    )
    .ok();

    let mut failures = 0u32;
    for (name, invocation) in FIXERS {
        let mut parts = invocation.split_whitespace();
        let program = parts.next().unwrap_or(name);
        let mut call = CommandCall::new(program, parts.map(str::to_string).collect());
        call.current_dir = Some(root.to_path_buf());

        match runner.run(&call) {
            Ok(result) if result.success() => {
                writeln!(
                    output,
                    "  {} {}",
                    "\u{2713}".if_supports_color(Stdout, |s| s.green()),
                    name
                )
                .ok();
            }
            Ok(result) => {
                failures += 1;
                writeln!(
                    output,
                    "  {} {} exited with status {}",
                    "\u{2717}".if_supports_color(Stdout, |s| s.red()),
                    name,
                    result.status
                )
                .ok();
            }
            Err(error) => {
                failures += 1;
                writeln!(
                    output,
                    "  {} {}",
                    "\u{2717}".if_supports_color(Stdout, |s| s.red()),
                    error
                )
                .ok();
            }
        }
    }

    Ok(if failures == 0 { 0 } else { 1 })
}
