use audit_cli::config::{self, CheckDefinition};
use audit_cli::error::AuditError;
use audit_cli::orchestrator::{self, RunOptions};
use audit_cli::reporter::{ConsolePresenter, Presenter, WalkthroughPresenter};
use audit_cli::runner::RealCommandRunner;
use audit_cli::{fix, target};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const USAGE: &str = "\
pyaudit - configuration-driven Python code audit

USAGE: pyaudit <MODE> [TARGET] [--config FILE] [--report FILE]

MODES:
  interactive      walk through each check with prompts
  automated [DIR]  run every check unattended (default: current directory)
  scan <TARGET>    audit a git URL, a directory, or a single file
  fix [DIR]        auto-correct formatting and imports (with backup)
  help             show this message

Exit code 0 means the run completed; individual check failures are data,
recorded in the report, never an orchestration error.
";

struct CliArgs {
    mode: Option<String>,
    target: Option<String>,
    config: Option<PathBuf>,
    report: PathBuf,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        mode: None,
        target: None,
        config: None,
        report: PathBuf::from("audit-report.md"),
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| "--config requires a file path".to_string())?;
                parsed.config = Some(PathBuf::from(value));
                i += 2;
            }
            "--report" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| "--report requires a file path".to_string())?;
                parsed.report = PathBuf::from(value);
                i += 2;
            }
            flag if flag.starts_with("--") && flag != "--help" => {
                return Err(format!("unknown flag '{flag}'"));
            }
            positional => {
                if parsed.mode.is_none() {
                    parsed.mode = Some(positional.to_string());
                } else if parsed.target.is_none() {
                    parsed.target = Some(positional.to_string());
                } else {
                    return Err(format!("unexpected argument '{positional}'"));
                }
                i += 1;
            }
        }
    }

    Ok(parsed)
}

fn load_registry(config_path: Option<&Path>) -> Result<Vec<CheckDefinition>, AuditError> {
    match config_path {
        Some(path) => config::load_registry_file(path),
        None => config::load_registry(config::DEFAULT_CHECKS),
    }
}

fn install_cancel_flag() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    let _ = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    });
    cancel
}

fn run_audit(
    cli: &CliArgs,
    root: &Path,
    presenter: &mut dyn Presenter,
) -> Result<i32, AuditError> {
    let registry = load_registry(cli.config.as_deref())?;
    let cancel = install_cancel_flag();
    let runner = RealCommandRunner;
    let options = RunOptions {
        root,
        report_path: &cli.report,
        cancel: &cancel,
    };

    let summary = orchestrator::run(&registry, &options, &runner, presenter)?;
    Ok(if summary.cancelled { 130 } else { 0 })
}

fn dispatch(cli: &CliArgs) -> Result<i32, AuditError> {
    let runner = RealCommandRunner;

    match cli.mode.as_deref() {
        None | Some("help") | Some("--help") | Some("-h") => {
            print!("{USAGE}");
            Ok(0)
        }
        Some("interactive") => {
            let mut presenter = WalkthroughPresenter::new();
            run_audit(cli, Path::new("."), &mut presenter)
        }
        Some("automated") => {
            let resolved = match cli.target.as_deref() {
                Some(spec) => target::resolve(spec, &runner)?,
                None => target::ResolvedTarget::Local(PathBuf::from(".")),
            };
            let mut presenter = ConsolePresenter;
            run_audit(cli, resolved.path(), &mut presenter)
        }
        Some("scan") => {
            let spec = cli.target.as_deref().ok_or_else(|| AuditError::Target {
                target: String::new(),
                reason: "scan requires a target (git URL, directory, or file)".to_string(),
            })?;
            let resolved = target::resolve(spec, &runner)?;
            let mut presenter = ConsolePresenter;
            run_audit(cli, resolved.path(), &mut presenter)
        }
        Some("fix") => {
            let root = PathBuf::from(cli.target.as_deref().unwrap_or("."));
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            fix::run_fix(&root, &runner, &mut input, &mut output)
        }
        Some(mode) => {
            eprintln!("unrecognized mode '{mode}'\n");
            eprint!("{USAGE}");
            Ok(1)
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("error: {message}\n");
            eprint!("{USAGE}");
            process::exit(1);
        }
    };

    match dispatch(&cli) {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            process::exit(1);
        }
    }
}
