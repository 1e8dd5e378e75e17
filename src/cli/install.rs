//! Install/uninstall orchestration for `uwd install` and `uwd uninstall`.
//!
//! Coordinates the multi-step install sequence: data directory creation,
//! starter config generation, systemd unit installation, and service
//! registration. The uninstall path reverses these steps with optional
//! config/data retention.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::config::{Config, PathsConfig};
use crate::daemon::service;

// ---------------------------------------------------------------------------
// Install plan
// ---------------------------------------------------------------------------

/// A single step in the install sequence.
#[derive(Debug, Clone, Serialize)]
pub struct InstallStep {
    /// Human-readable description.
    pub description: String,
    /// Whether this step completed successfully.
    pub done: bool,
    /// Error message if the step failed.
    pub error: Option<String>,
}

/// Structured report from an install run.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Ordered list of steps attempted.
    pub steps: Vec<InstallStep>,
    /// Overall success.
    pub success: bool,
    /// Path to the config file (written or preserved).
    pub config_path: Option<PathBuf>,
    /// Path to the data directory (if created).
    pub data_dir: Option<PathBuf>,
    /// Path to the installed unit file (if written).
    pub unit_path: Option<PathBuf>,
    /// Whether the service was enabled and started.
    pub enabled: bool,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl InstallReport {
    fn new(dry_run: bool) -> Self {
        Self {
            steps: Vec::new(),
            success: false,
            config_path: None,
            data_dir: None,
            unit_path: None,
            enabled: false,
            dry_run,
        }
    }

    fn step_ok(&mut self, description: impl Into<String>) {
        self.steps.push(InstallStep {
            description: description.into(),
            done: true,
            error: None,
        });
    }

    fn step_fail(&mut self, description: impl Into<String>, error: impl Into<String>) {
        self.steps.push(InstallStep {
            description: description.into(),
            done: false,
            error: Some(error.into()),
        });
    }

    fn step_plan(&mut self, description: impl Into<String>) {
        self.steps.push(InstallStep {
            description: description.into(),
            done: false,
            error: None,
        });
    }
}

// ---------------------------------------------------------------------------
// Install options
// ---------------------------------------------------------------------------

/// Options controlling the install orchestration.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Config to write when none exists yet.
    pub config: Config,
    /// Where the unit file goes.
    pub unit_path: PathBuf,
    /// Enable and start the service after installing the unit.
    pub enable: bool,
    /// Run `systemctl` at all. Cleared by `--no-register` for chroot or
    /// image builds where systemd is not running.
    pub register: bool,
    /// Show plan without executing.
    pub dry_run: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            config: Config::default(),
            unit_path: PathBuf::from(service::UNIT_PATH),
            enable: true,
            register: true,
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Install orchestration
// ---------------------------------------------------------------------------

/// Run the install sequence. Returns a structured report.
///
/// Steps:
/// 1. Create data directory.
/// 2. Write starter config (an existing config is left untouched).
/// 3. Write the systemd unit file.
/// 4. `systemctl daemon-reload`.
/// 5. `systemctl enable --now` (unless `--no-enable`).
pub fn run_install_sequence(opts: &InstallOptions) -> InstallReport {
    let mut report = InstallReport::new(opts.dry_run);
    let paths = &opts.config.paths;

    // Step 1: Create data directory.
    let data_dir = paths
        .state_file
        .parent()
        .unwrap_or_else(|| Path::new("/tmp"))
        .to_path_buf();

    if opts.dry_run {
        report.step_plan(format!("Create data directory: {}", data_dir.display()));
    } else {
        match std::fs::create_dir_all(&data_dir) {
            Ok(()) => {
                report.step_ok(format!("Created data directory: {}", data_dir.display()));
                report.data_dir = Some(data_dir);
            }
            Err(e) => {
                report.step_fail(
                    format!("Create data directory: {}", data_dir.display()),
                    e.to_string(),
                );
                return report;
            }
        }
    }

    // Step 2: Write starter config, never clobbering an existing one.
    let config_path = &paths.config_file;
    if opts.dry_run {
        if config_path.is_file() {
            report.step_plan(format!("Keep existing config: {}", config_path.display()));
        } else {
            report.step_plan(format!("Write starter config: {}", config_path.display()));
        }
    } else if config_path.is_file() {
        report.step_ok(format!(
            "Config already present, left untouched: {}",
            config_path.display()
        ));
        report.config_path = Some(config_path.clone());
    } else {
        match opts.config.save() {
            Ok(()) => {
                report.step_ok(format!("Wrote starter config: {}", config_path.display()));
                report.config_path = Some(config_path.clone());
            }
            Err(e) => {
                report.step_fail(
                    format!("Write starter config: {}", config_path.display()),
                    e.to_string(),
                );
                return report;
            }
        }
    }

    // Step 3: Write the unit file.
    if opts.dry_run {
        report.step_plan(format!("Write unit file: {}", opts.unit_path.display()));
    } else {
        match write_unit_file(&opts.unit_path, config_path) {
            Ok(()) => {
                report.step_ok(format!("Wrote unit file: {}", opts.unit_path.display()));
                report.unit_path = Some(opts.unit_path.clone());
            }
            Err(e) => {
                report.step_fail(
                    format!("Write unit file: {}", opts.unit_path.display()),
                    e.to_string(),
                );
                return report;
            }
        }
    }

    // Steps 4-5: systemd registration.
    if opts.dry_run {
        if opts.register {
            report.step_plan("Reload systemd unit definitions");
            if opts.enable {
                report.step_plan(format!("Enable and start {}", service::UNIT_NAME));
            }
        }
    } else if opts.register {
        match service::daemon_reload() {
            Ok(()) => report.step_ok("Reloaded systemd unit definitions"),
            Err(e) => {
                report.step_fail("Reload systemd unit definitions", e.to_string());
                return report;
            }
        }
        if opts.enable {
            match service::enable_now(service::UNIT_NAME) {
                Ok(()) => {
                    report.step_ok(format!("Enabled and started {}", service::UNIT_NAME));
                    report.enabled = true;
                }
                Err(e) => {
                    report.step_fail(
                        format!("Enable and start {}", service::UNIT_NAME),
                        e.to_string(),
                    );
                }
            }
        }
    } else {
        report.step_ok("Skipped systemd registration (--no-register)");
    }

    report.success = report.steps.iter().all(|s| s.error.is_none());
    report
}

fn write_unit_file(unit_path: &Path, config_path: &Path) -> std::io::Result<()> {
    let binary = std::env::current_exe()?;
    if let Some(parent) = unit_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(unit_path, service::render_unit(&binary, config_path))
}

// ---------------------------------------------------------------------------
// Uninstall options and report
// ---------------------------------------------------------------------------

/// Options for uninstall.
#[derive(Debug, Clone)]
pub struct UninstallOptions {
    /// Keep the data directory (state file, history, journal).
    pub keep_data: bool,
    /// Keep the config file.
    pub keep_config: bool,
    /// Run `systemctl` at all.
    pub register: bool,
    /// Show plan without executing.
    pub dry_run: bool,
    /// Paths config for locating artifacts.
    pub paths: PathsConfig,
    /// Where the unit file lives.
    pub unit_path: PathBuf,
}

impl Default for UninstallOptions {
    fn default() -> Self {
        Self {
            keep_data: false,
            keep_config: false,
            register: true,
            dry_run: false,
            paths: PathsConfig::default(),
            unit_path: PathBuf::from(service::UNIT_PATH),
        }
    }
}

/// Structured report from an uninstall run.
#[derive(Debug, Clone, Serialize)]
pub struct UninstallReport {
    /// Steps attempted.
    pub steps: Vec<InstallStep>,
    /// Overall success.
    pub success: bool,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Run the uninstall sequence: stop and unregister the service, then remove
/// the artifacts the install created.
pub fn run_uninstall_sequence(opts: &UninstallOptions) -> UninstallReport {
    let mut report = UninstallReport {
        steps: Vec::new(),
        success: true,
        dry_run: opts.dry_run,
    };

    let unit_installed = opts.unit_path.is_file();

    // Stop and disable before removing the unit file.
    if opts.register {
        if opts.dry_run {
            report.steps.push(InstallStep {
                description: format!("Stop and disable {}", service::UNIT_NAME),
                done: false,
                error: None,
            });
        } else if unit_installed {
            match service::disable_now(service::UNIT_NAME) {
                Ok(()) => report.steps.push(InstallStep {
                    description: format!("Stopped and disabled {}", service::UNIT_NAME),
                    done: true,
                    error: None,
                }),
                Err(e) => {
                    report.steps.push(InstallStep {
                        description: format!("Stop and disable {}", service::UNIT_NAME),
                        done: false,
                        error: Some(e.to_string()),
                    });
                    report.success = false;
                }
            }
        } else {
            report.steps.push(InstallStep {
                description: "Unit file not found, nothing to disable".to_string(),
                done: true,
                error: None,
            });
        }
    }

    cleanup_file(&opts.unit_path, "unit file", opts.dry_run, &mut report);

    if opts.register && unit_installed && !opts.dry_run {
        match service::daemon_reload() {
            Ok(()) => report.steps.push(InstallStep {
                description: "Reloaded systemd unit definitions".to_string(),
                done: true,
                error: None,
            }),
            Err(e) => {
                report.steps.push(InstallStep {
                    description: "Reload systemd unit definitions".to_string(),
                    done: false,
                    error: Some(e.to_string()),
                });
                report.success = false;
            }
        }
    }

    if !opts.keep_data {
        let data_dir = opts
            .paths
            .state_file
            .parent()
            .unwrap_or_else(|| Path::new("/tmp"));
        cleanup_directory(data_dir, "data directory", opts.dry_run, &mut report);
    }

    if !opts.keep_config {
        cleanup_file(&opts.paths.config_file, "config", opts.dry_run, &mut report);
    }

    report
}

fn cleanup_directory(dir: &Path, label: &str, dry_run: bool, report: &mut UninstallReport) {
    if dry_run {
        report.steps.push(InstallStep {
            description: format!("Remove {label}: {}", dir.display()),
            done: false,
            error: None,
        });
    } else if dir.is_dir() {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {
                report.steps.push(InstallStep {
                    description: format!("Removed {label}: {}", dir.display()),
                    done: true,
                    error: None,
                });
            }
            Err(e) => {
                report.steps.push(InstallStep {
                    description: format!("Remove {label}: {}", dir.display()),
                    done: false,
                    error: Some(e.to_string()),
                });
                report.success = false;
            }
        }
    } else {
        report.steps.push(InstallStep {
            description: format!("{label} not found: {}", dir.display()),
            done: true,
            error: None,
        });
    }
}

fn cleanup_file(path: &Path, label: &str, dry_run: bool, report: &mut UninstallReport) {
    if dry_run {
        report.steps.push(InstallStep {
            description: format!("Remove {label}: {}", path.display()),
            done: false,
            error: None,
        });
    } else if path.is_file() {
        match std::fs::remove_file(path) {
            Ok(()) => {
                report.steps.push(InstallStep {
                    description: format!("Removed {label}: {}", path.display()),
                    done: true,
                    error: None,
                });
            }
            Err(e) => {
                report.steps.push(InstallStep {
                    description: format!("Remove {label}: {}", path.display()),
                    done: false,
                    error: Some(e.to_string()),
                });
                report.success = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Human formatting
// ---------------------------------------------------------------------------

/// Format an install report for terminal output.
#[must_use]
pub fn format_install_report(report: &InstallReport) -> String {
    let mut out = String::new();

    let mode = if report.dry_run { "dry-run" } else { "install" };
    let _ = writeln!(out, "uwd {mode} report:\n");

    for step in &report.steps {
        let icon = if step.error.is_some() {
            "FAIL"
        } else if step.done {
            "DONE"
        } else {
            "PLAN"
        };
        let _ = writeln!(out, "  [{icon}] {}", step.description);
        if let Some(err) = &step.error {
            let _ = writeln!(out, "         error: {err}");
        }
    }

    if !report.dry_run && report.success {
        out.push('\n');
        if let Some(ref config) = report.config_path {
            let _ = writeln!(out, "  Config: {}", config.display());
        }
        if let Some(ref data) = report.data_dir {
            let _ = writeln!(out, "  Data:   {}", data.display());
        }
        if let Some(ref unit) = report.unit_path {
            let _ = writeln!(out, "  Unit:   {}", unit.display());
        }
        if report.enabled {
            let _ = writeln!(out, "\n  The watchdog is running. Track a unit with `uwd add`.");
        }
    }

    out
}

/// Format an uninstall report for terminal output.
#[must_use]
pub fn format_uninstall_report(report: &UninstallReport) -> String {
    let mut out = String::new();

    let mode = if report.dry_run {
        "dry-run"
    } else {
        "uninstall"
    };
    let _ = writeln!(out, "uwd {mode} cleanup report:\n");

    for step in &report.steps {
        let icon = if step.error.is_some() {
            "FAIL"
        } else if step.done {
            "DONE"
        } else {
            "PLAN"
        };
        let _ = writeln!(out, "  [{icon}] {}", step.description);
        if let Some(err) = &step.error {
            let _ = writeln!(out, "         error: {err}");
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
