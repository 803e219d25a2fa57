use crate::classifier::{CheckOutcome, Status};
use crate::config::CheckDefinition;
use crate::report::RunReport;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use std::io::{self, BufRead, Write};
use std::path::Path;

const NAME_WIDTH: usize = 12;

/// Seam between the orchestrator and the terminal. The orchestrator never
/// prints; a presenter decides what a completed check looks like.
pub trait Presenter {
    /// Called before a check runs. Returning false stops the run (the
    /// report still covers everything attempted so far).
    fn before_check(&mut self, index: usize, total: usize, def: &CheckDefinition) -> bool;

    /// Called once per completed check, immediately.
    fn outcome(&mut self, outcome: &CheckOutcome, duration_ms: u64);

    /// Called once after the report is persisted.
    fn finished(&mut self, report: &RunReport, report_path: &Path);
}

fn status_glyph(status: Status) -> &'static str {
    match status {
        Status::Pass => "\u{2713}",
        Status::Warning => "\u{26a0}",
        Status::Fail => "\u{2717}",
        Status::Unknown => "?",
    }
}

/// Uncolored text pieces of one display line; the presenters add color.
pub fn outcome_line(outcome: &CheckOutcome, duration_ms: u64) -> (String, String) {
    let left = format!(
        "{} {:<width$}",
        status_glyph(outcome.status),
        outcome.check_name,
        width = NAME_WIDTH
    );
    let right = format!("{}  ({:.1}s)", outcome.message, duration_ms as f64 / 1000.0);
    (left, right)
}

fn print_outcome_line(outcome: &CheckOutcome, duration_ms: u64) {
    let (left, right) = outcome_line(outcome, duration_ms);
    let line = match outcome.status {
        Status::Pass => format!(
            "  {} {}",
            left.if_supports_color(Stdout, |s| s.green()),
            right.if_supports_color(Stdout, |s| s.dimmed()),
        ),
        Status::Warning => format!(
            "  {} {}",
            left.if_supports_color(Stdout, |s| s.yellow()),
            right.if_supports_color(Stdout, |s| s.dimmed()),
        ),
        Status::Fail => format!(
            "  {} {}",
            left.if_supports_color(Stdout, |s| s.red()),
            right.if_supports_color(Stdout, |s| s.dimmed()),
        ),
        Status::Unknown => format!(
            "  {} {}",
            left.if_supports_color(Stdout, |s| s.dimmed()),
            right.if_supports_color(Stdout, |s| s.dimmed()),
        ),
    };
    println!("{line}");
}

fn print_trailer(report: &RunReport, report_path: &Path) {
    let detail = format!(
        "({} check(s), {} issue(s))  Report: {}",
        report.entries.len(),
        report.total_issues,
        report_path.display(),
    );

    println!();
    if report.count(Status::Fail) > 0 {
        println!(
            "  {} {}",
            "FAIL".if_supports_color(Stdout, |s| s.red()),
            detail.if_supports_color(Stdout, |s| s.dimmed()),
        );
    } else if report.count(Status::Warning) > 0 || report.count(Status::Unknown) > 0 {
        println!(
            "  {} {}",
            "WARN".if_supports_color(Stdout, |s| s.yellow()),
            detail.if_supports_color(Stdout, |s| s.dimmed()),
        );
    } else {
        println!(
            "  {} {}",
            "PASS".if_supports_color(Stdout, |s| s.green()),
            detail.if_supports_color(Stdout, |s| s.dimmed()),
        );
    }
    println!();
}

/// Unattended mode: one line per outcome, no prompting.
#[derive(Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn before_check(&mut self, _index: usize, _total: usize, _def: &CheckDefinition) -> bool {
        true
    }

    fn outcome(&mut self, outcome: &CheckOutcome, duration_ms: u64) {
        print_outcome_line(outcome, duration_ms);
    }

    fn finished(&mut self, report: &RunReport, report_path: &Path) {
        print_trailer(report, report_path);
    }
}

/// Interactive walkthrough: shows each check's description and waits for
/// Enter before running it; `q` stops the run early.
pub struct WalkthroughPresenter<R: BufRead> {
    input: R,
}

impl WalkthroughPresenter<io::BufReader<io::Stdin>> {
    pub fn new() -> Self {
        WalkthroughPresenter {
            input: io::BufReader::new(io::stdin()),
        }
    }
}

impl Default for WalkthroughPresenter<io::BufReader<io::Stdin>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead> WalkthroughPresenter<R> {
    pub fn with_input(input: R) -> Self {
        WalkthroughPresenter { input }
    }
}

impl<R: BufRead> Presenter for WalkthroughPresenter<R> {
    fn before_check(&mut self, index: usize, total: usize, def: &CheckDefinition) -> bool {
        println!();
        println!(
            "Check {}/{}: {}",
            index + 1,
            total,
            def.name.if_supports_color(Stdout, |s| s.bold()),
        );
        println!("  {}", def.description.if_supports_color(Stdout, |s| s.dimmed()));
        print!("  Press Enter to run, q to stop: ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if self.input.read_line(&mut line).is_err() {
            return false;
        }
        line.trim() != "q"
    }

    fn outcome(&mut self, outcome: &CheckOutcome, duration_ms: u64) {
        print_outcome_line(outcome, duration_ms);
    }

    fn finished(&mut self, report: &RunReport, report_path: &Path) {
        print_trailer(report, report_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: Status, message: &str) -> CheckOutcome {
        CheckOutcome {
            check_name: "security".to_string(),
            status,
            message: message.to_string(),
            issue_count: None,
        }
    }

    fn definition() -> CheckDefinition {
        CheckDefinition {
            name: "security".to_string(),
            invocation: "bandit -r .".to_string(),
            target_path: ".".to_string(),
            issue_threshold: 2,
            description: "Security issues flagged by bandit".to_string(),
        }
    }

    #[test]
    fn outcome_line_pads_name_and_shows_duration() {
        let (left, right) = outcome_line(&outcome(Status::Pass, "no issues found"), 1500);
        assert!(left.starts_with("\u{2713} security"));
        assert_eq!(left.len(), "\u{2713} ".len() + NAME_WIDTH);
        assert_eq!(right, "no issues found  (1.5s)");
    }

    #[test]
    fn glyphs_track_status() {
        assert!(outcome_line(&outcome(Status::Fail, "x"), 0).0.starts_with("\u{2717}"));
        assert!(outcome_line(&outcome(Status::Warning, "x"), 0).0.starts_with("\u{26a0}"));
        assert!(outcome_line(&outcome(Status::Unknown, "x"), 0).0.starts_with("?"));
    }

    #[test]
    fn walkthrough_enter_continues() {
        let mut presenter = WalkthroughPresenter::with_input("\n".as_bytes());
        assert!(presenter.before_check(0, 6, &definition()));
    }

    #[test]
    fn walkthrough_q_stops() {
        let mut presenter = WalkthroughPresenter::with_input("q\n".as_bytes());
        assert!(!presenter.before_check(0, 6, &definition()));
    }

    #[test]
    fn walkthrough_exhausted_input_continues_like_enter() {
        // EOF reads an empty line, which is not "q"
        let mut presenter = WalkthroughPresenter::with_input("".as_bytes());
        assert!(presenter.before_check(0, 6, &definition()));
    }
}
