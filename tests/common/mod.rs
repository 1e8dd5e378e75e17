//! Shared harness for CLI integration tests: runs the `uwd` binary and
//! captures stdout/stderr into a per-case log file for post-mortem reads.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

/// Captured outcome of one CLI invocation.
pub struct CliCaseResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

/// Run `uwd` with `args` and capture everything it said.
///
/// `NO_COLOR` is set so assertions never trip over ANSI escapes.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CliCaseResult {
    let output = Command::new(env!("CARGO_BIN_EXE_uwd"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("uwd binary should spawn");

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    let log_path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(format!("{case_name}.log"));
    let log = format!(
        "case: {case_name}\nargs: {args:?}\nstatus: {:?}\n\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}",
        output.status
    );
    fs::write(&log_path, log).expect("case log should be writable");

    CliCaseResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}
