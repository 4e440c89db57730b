use std::path::Path;

use anyhow::Result;

use yuta_config::{Severity, ValidationResult};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Load, validate and print diagnostics. Exits with status 1 on errors.
pub fn check(explicit: Option<&Path>, verbose: bool) -> Result<()> {
    let result = run_checks(explicit)?;

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    }

    let lines = report(&result, verbose);
    for line in &lines {
        eprintln!("{line}");
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !lines.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn run_checks(explicit: Option<&Path>) -> Result<ValidationResult> {
    let path = yuta_config::find_config_file(explicit)?;
    let value = yuta_config::load_config_value(&path)?;
    let config = yuta_config::load_config(&path)?;

    let mut result = yuta_config::validate(&config);
    result
        .diagnostics
        .extend(yuta_config::unknown_fields(&value));
    result.config_path = Some(path);
    Ok(result)
}

fn report(result: &ValidationResult, verbose: bool) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(|d| {
            let (color, label) = match d.severity {
                Severity::Error => (RED, "error"),
                Severity::Warning => (YELLOW, "warning"),
                Severity::Info => (CYAN, "info"),
            };
            if d.path.is_empty() {
                format!("  {BOLD}{color}{label}{RESET} {}", d.message)
            } else {
                format!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message)
            }
        })
        .collect()
}
