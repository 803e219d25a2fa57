use crate::environment::parse_version;
use crate::runner;
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::process::Command;

const LABEL_WIDTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub installed: bool,
    pub version: Option<String>,
}

#[derive(Debug)]
struct ToolSpec {
    name: &'static str,
    install_command: &'static str,
    min_major: Option<u32>,
}

static TOOL_SPECS: &[ToolSpec] = &[
    ToolSpec {
        name: "python3",
        install_command: "# install Python 3 from python.org or your package manager",
        min_major: Some(3),
    },
    ToolSpec {
        name: "bandit",
        install_command: "python3 -m pip install bandit",
        min_major: None,
    },
    ToolSpec {
        name: "flake8",
        install_command: "python3 -m pip install flake8",
        min_major: None,
    },
    ToolSpec {
        name: "mypy",
        install_command: "python3 -m pip install mypy",
        min_major: None,
    },
    ToolSpec {
        name: "black",
        install_command: "python3 -m pip install black",
        min_major: None,
    },
    ToolSpec {
        name: "isort",
        install_command: "python3 -m pip install isort",
        min_major: None,
    },
    ToolSpec {
        name: "pytest",
        install_command: "python3 -m pip install pytest",
        min_major: None,
    },
];

pub fn run<W, P>(writer: &mut W, fast_mode: bool, probe_tool: P) -> io::Result<i32>
where
    W: Write,
    P: Fn(&str) -> ProbeResult,
{
    let mut issues = 0u32;
    let mut install_commands: Vec<&'static str> = Vec::new();

    writeln!(writer)?;

    for spec in TOOL_SPECS {
        let probe = probe_tool(spec.name);
        if !probe.installed {
            issues += 1;
            install_commands.push(spec.install_command);
            print_line(writer, false, spec.name, "not found")?;
            continue;
        }

        let detail = if fast_mode {
            "installed (fast)".to_string()
        } else if let Some(min_major) = spec.min_major {
            if let Some(version) = probe.version {
                if let Some(major) = major_from_version(&version) {
                    if major < min_major {
                        issues += 1;
                        install_commands.push(spec.install_command);
                        format!("v{version} (need \u{2265} {min_major})")
                    } else {
                        format!("v{version} (\u{2265} {min_major})")
                    }
                } else {
                    "installed".to_string()
                }
            } else {
                "installed".to_string()
            }
        } else if let Some(version) = probe.version {
            format!("v{version}")
        } else {
            "installed".to_string()
        };

        if detail.contains("need \u{2265}") {
            print_line(writer, false, spec.name, &detail)?;
        } else {
            print_line(writer, true, spec.name, &detail)?;
        }
    }

    writeln!(writer)?;
    if issues == 0 {
        writeln!(
            writer,
            "  {}  {}",
            "PASS".green().bold(),
            "All checker tools are installed.".dimmed()
        )?;
        writeln!(writer)?;
        return Ok(0);
    }

    writeln!(
        writer,
        "  {}  {}",
        "FAIL".red().bold(),
        format!("{issues} issue(s) found. Install missing tools:").dimmed()
    )?;

    for command in install_commands {
        writeln!(writer, "    {command}")?;
    }
    writeln!(writer)?;

    Ok(1)
}

pub fn probe_tool(command: &str) -> ProbeResult {
    if !runner::command_exists(command) {
        return ProbeResult {
            installed: false,
            version: None,
        };
    }

    let output =
        probe_version_output(command, "--version").or_else(|| probe_version_output(command, "-V"));
    let version = output.and_then(|text| parse_version(&text));

    ProbeResult {
        installed: true,
        version,
    }
}

fn probe_version_output(command: &str, arg: &str) -> Option<String> {
    let output = Command::new(command).arg(arg).output().ok()?;
    if output.status.success() || !output.stdout.is_empty() || !output.stderr.is_empty() {
        let text = String::from_utf8_lossy(&output.stdout).to_string()
            + &String::from_utf8_lossy(&output.stderr);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    } else {
        None
    }
}

pub fn major_from_version(version: &str) -> Option<u32> {
    version.split('.').next()?.parse::<u32>().ok()
}

fn print_line(writer: &mut dyn Write, ok: bool, name: &str, detail: &str) -> io::Result<()> {
    if ok {
        writeln!(
            writer,
            "  {} {:<width$} {}",
            "\u{2713}".green(),
            name,
            detail.dimmed(),
            width = LABEL_WIDTH
        )
    } else {
        writeln!(
            writer,
            "  {} {:<width$} {}",
            "\u{2717}".red(),
            name,
            detail.dimmed(),
            width = LABEL_WIDTH
        )
    }
}
