use crate::aggregator::Aggregator;
use crate::classifier::{self, CheckOutcome, Status};
use crate::config::CheckDefinition;
use crate::environment::EnvironmentInfo;
use crate::error::AuditError;
use crate::report::{self, CheckRecord, RunReport};
use crate::reporter::Presenter;
use crate::runner::{self, CommandRunner};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct RunOptions<'a> {
    pub root: &'a Path,
    pub report_path: &'a Path,
    pub cancel: &'a AtomicBool,
}

#[derive(Debug)]
pub struct RunSummary {
    pub configured: usize,
    pub attempted: usize,
    pub total_issues: u32,
    pub cancelled: bool,
    pub report_path: PathBuf,
}

/// Drives one run: registry iteration, executor, classifier, aggregator.
/// The aggregator is owned here and reset at the start of every run.
pub struct Orchestrator<'a> {
    runner: &'a dyn CommandRunner,
    aggregator: Aggregator,
}

impl<'a> Orchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            aggregator: Aggregator::new(),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Run every configured check in order. No per-check outcome ever
    /// halts the loop: launch failures and classification gaps become
    /// outcomes like any other, and the next check still runs. The cancel
    /// flag is consulted between checks only, never mid-check.
    pub fn run_checks(
        &mut self,
        registry: &[CheckDefinition],
        root: &Path,
        presenter: &mut dyn Presenter,
        cancel: &AtomicBool,
    ) -> (Vec<CheckRecord>, bool) {
        self.aggregator.reset();
        let mut records = Vec::with_capacity(registry.len());
        let mut cancelled = false;

        for (index, def) in registry.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                cancelled = true;
                break;
            }
            if !presenter.before_check(index, registry.len(), def) {
                cancelled = true;
                break;
            }

            let (outcome, record) = self.run_one(def, root);
            presenter.outcome(&outcome, record.duration_ms);
            self.aggregator.record(outcome);
            records.push(record);
        }

        (records, cancelled)
    }

    fn run_one(&self, def: &CheckDefinition, root: &Path) -> (CheckOutcome, CheckRecord) {
        match runner::execute(def, root, self.runner) {
            Ok(result) => {
                let outcome = classifier::classify(def.kind(), &result, def.issue_threshold);
                let (excerpt, omitted_lines) = report::excerpt(&result.raw_output);
                let record = CheckRecord {
                    check_name: def.name.clone(),
                    duration_ms: result.duration_ms,
                    excerpt,
                    omitted_lines,
                };
                (outcome, record)
            }
            Err(error) => {
                // A check that cannot even start still yields an outcome.
                let outcome = CheckOutcome {
                    check_name: def.name.clone(),
                    status: Status::Fail,
                    message: error.to_string(),
                    issue_count: None,
                };
                let record = CheckRecord {
                    check_name: def.name.clone(),
                    ..CheckRecord::default()
                };
                (outcome, record)
            }
        }
    }
}

/// One full pass: checks, then the persisted report. The only fallible
/// steps are configuration loading (upstream of this call) and report
/// persistence, so check failures can never produce an `Err` here.
pub fn run(
    registry: &[CheckDefinition],
    options: &RunOptions<'_>,
    runner: &dyn CommandRunner,
    presenter: &mut dyn Presenter,
) -> Result<RunSummary, AuditError> {
    let mut orchestrator = Orchestrator::new(runner);
    let (records, cancelled) =
        orchestrator.run_checks(registry, options.root, presenter, options.cancel);

    let mut programs: Vec<&str> = Vec::new();
    for def in registry {
        let kind = def.kind();
        if !kind.is_empty() && !programs.contains(&kind) {
            programs.push(kind);
        }
    }
    let environment = EnvironmentInfo::collect(runner, &programs);

    let report = RunReport::build(
        orchestrator.aggregator(),
        &records,
        environment,
        options.root,
    );
    report::write_report(&report, options.report_path)?;
    presenter.finished(&report, options.report_path);

    Ok(RunSummary {
        configured: registry.len(),
        attempted: report.entries.len(),
        total_issues: report.total_issues,
        cancelled,
        report_path: options.report_path.to_path_buf(),
    })
}
