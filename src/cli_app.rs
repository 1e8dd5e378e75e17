//! Top-level CLI definition and dispatch.
//!
//! Every subcommand resolves the config path the same way: `--config` wins,
//! otherwise the system default. Read-only commands (status, history, config)
//! never touch the state file or the alert history.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use serde::Serialize;

use crate::cli::install::{
    self, InstallOptions, UninstallOptions, format_install_report, format_uninstall_report,
};
use crate::core::config::{Config, validate_unit_name};
use crate::core::errors::{Result, UwdError};
use crate::daemon::loop_main::{MonitorScheduler, SchedulerSettings};
use crate::daemon::signals;
use crate::logger::dual::DualLogger;
use crate::logger::sqlite::HistoryStore;
use crate::monitor::probe::{self, ServiceState, Systemctl};
use crate::monitor::transition::{AlertEvent, Severity};
use crate::notify::Dispatcher;
use crate::state::StateStore;

/// Unit Watchdog: alerts when tracked systemd services change state.
#[derive(Debug, Parser)]
#[command(name = "uwd", version, about)]
pub struct Cli {
    /// Path to the config file (default: /etc/uwd/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install uwd as a systemd service.
    Install {
        /// Show the plan without executing it.
        #[arg(long)]
        dry_run: bool,
        /// Write the unit file but do not enable or start the service.
        #[arg(long)]
        no_enable: bool,
        /// Skip systemctl entirely (chroot and image builds).
        #[arg(long)]
        no_register: bool,
    },
    /// Uninstall the uwd systemd service and its files.
    Uninstall {
        /// Show the plan without executing it.
        #[arg(long)]
        dry_run: bool,
        /// Keep the state file, alert history, and event journal.
        #[arg(long)]
        keep_data: bool,
        /// Keep the config file.
        #[arg(long)]
        keep_config: bool,
        /// Skip systemctl entirely.
        #[arg(long)]
        no_register: bool,
    },
    /// Probe every tracked service once and print a status table.
    Status {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Track one or more units.
    Add {
        /// Unit names, e.g. `nginx.service`.
        #[arg(value_name = "UNIT", required = true)]
        units: Vec<String>,
    },
    /// Stop tracking one or more units.
    Remove {
        /// Unit names to drop.
        #[arg(value_name = "UNIT", required = true)]
        units: Vec<String>,
    },
    /// Show recent alerts, newest first.
    History {
        /// Maximum number of alerts to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send a test notification through the configured sinks.
    TestNotify,
    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Run the monitoring loop in the foreground (used by systemd).
    Daemon,
}

/// `uwd config` subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the resolved config file path.
    Path,
}

/// Resolve the config path and dispatch to the selected command.
pub fn run(cli: &Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match &cli.command {
        Command::Install {
            dry_run,
            no_enable,
            no_register,
        } => run_install(&config_path, *dry_run, *no_enable, *no_register),
        Command::Uninstall {
            dry_run,
            keep_data,
            keep_config,
            no_register,
        } => run_uninstall(&config_path, *dry_run, *keep_data, *keep_config, *no_register),
        Command::Status { json } => run_status(&config_path, *json),
        Command::Add { units } => run_add(&config_path, units),
        Command::Remove { units } => run_remove(&config_path, units),
        Command::History { limit, json } => run_history(&config_path, *limit, *json),
        Command::TestNotify => run_test_notify(&config_path),
        Command::Config(sub) => run_config(&config_path, sub),
        Command::Completions { shell } => {
            run_completions(*shell);
            Ok(())
        }
        Command::Daemon => run_daemon(&config_path),
    }
}

/// Load the config, or scaffold a fresh in-memory one when the file does not
/// exist yet. Nothing is written until the caller saves.
fn load_or_scaffold(config_path: &Path) -> Result<Config> {
    match Config::load(config_path) {
        Err(UwdError::MissingConfig { .. }) => Ok(Config::scaffold(config_path)),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// daemon
// ---------------------------------------------------------------------------

fn run_daemon(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    if config.monitor.services.is_empty() {
        return Err(UwdError::NoServicesConfigured);
    }

    let store = match StateStore::open(&config.paths.state_file) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("uwd: state file unreadable, starting from scratch: {e}");
            StateStore::empty(&config.paths.state_file)
        }
    };
    if store.skipped_lines() > 0 {
        eprintln!(
            "uwd: ignored {} corrupt state line(s) in {}",
            store.skipped_lines(),
            config.paths.state_file.display()
        );
    }

    let log = DualLogger::open(&config.paths);
    let dispatcher = Dispatcher::from_config(&config.notify);
    let shutdown = signals::shutdown_channel()?;

    println!(
        "uwd: watching {} service(s) every {}s",
        config.monitor.services.len(),
        config.monitor.interval_secs
    );

    let mut scheduler = MonitorScheduler::new(
        SchedulerSettings {
            interval: config.monitor.interval(),
            services: config.monitor.services.clone(),
        },
        Box::new(Systemctl),
        store,
        dispatcher,
        log,
        shutdown,
    );
    scheduler.run();

    println!("uwd: stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

/// One row of `uwd status` output.
#[derive(Serialize)]
struct StatusRow {
    service: String,
    observed: Option<ServiceState>,
    last_known: Option<ServiceState>,
    error: Option<String>,
}

fn run_status(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let store = StateStore::open(&config.paths.state_file)
        .unwrap_or_else(|_| StateStore::empty(&config.paths.state_file));

    // Read-only: the daemon owns state updates, status never writes.
    let query = Systemctl;
    let rows: Vec<StatusRow> = config
        .monitor
        .services
        .iter()
        .map(|unit| match probe::probe(&query, unit) {
            Ok(state) => StatusRow {
                service: unit.clone(),
                observed: Some(state),
                last_known: store.get(unit),
                error: None,
            },
            Err(e) => StatusRow {
                service: unit.clone(),
                observed: None,
                last_known: store.get(unit),
                error: Some(e.to_string()),
            },
        })
        .collect();

    if json {
        let payload = serde_json::json!({ "command": "status", "services": rows });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("no services tracked; add one with `uwd add <unit>`");
        return Ok(());
    }

    let width = rows
        .iter()
        .map(|r| r.service.len())
        .max()
        .unwrap_or(0)
        .max("SERVICE".len());
    println!("{:<width$}  {:<12}  {}", "SERVICE", "STATE", "LAST KNOWN");
    for row in &rows {
        let state = row
            .observed
            .map_or_else(|| format!("{:<12}", "unavailable").dimmed(), paint_state);
        let last = row.last_known.map_or("-", ServiceState::as_str);
        println!("{:<width$}  {state}  {last}", row.service);
        if let Some(err) = &row.error {
            eprintln!("uwd: {err}");
        }
    }
    Ok(())
}

/// Pad first, then color: ANSI escapes confuse `format!` width handling.
fn paint_state(state: ServiceState) -> colored::ColoredString {
    let padded = format!("{:<12}", state.as_str());
    match state {
        ServiceState::Active => padded.green(),
        ServiceState::Failed => padded.red().bold(),
        ServiceState::Inactive => padded.yellow(),
        ServiceState::NotFound => padded.magenta(),
    }
}

// ---------------------------------------------------------------------------
// add / remove
// ---------------------------------------------------------------------------

fn run_add(config_path: &Path, units: &[String]) -> Result<()> {
    let mut config = load_or_scaffold(config_path)?;
    let mut added = Vec::new();
    for unit in units {
        validate_unit_name(unit)?;
        if config.monitor.add_service(unit) {
            added.push(unit.as_str());
        } else {
            println!("{unit} is already tracked");
        }
    }
    config.save()?;
    for unit in added {
        println!("tracking {unit}");
    }
    println!(
        "{} service(s) tracked in {}",
        config.monitor.services.len(),
        config.paths.config_file.display()
    );
    Ok(())
}

fn run_remove(config_path: &Path, units: &[String]) -> Result<()> {
    let mut config = Config::load(config_path)?;
    // Validate the whole batch before touching anything.
    for unit in units {
        if !config.monitor.services.iter().any(|s| s == unit) {
            return Err(UwdError::InvalidConfig {
                details: format!("{unit} is not tracked"),
            });
        }
    }
    for unit in units {
        config.monitor.remove_service(unit);
    }
    config.save()?;
    for unit in units {
        println!("stopped tracking {unit}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

fn run_history(config_path: &Path, limit: usize, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    // Opening would create an empty database; skip that for a pure read.
    let alerts = if config.paths.history_db.is_file() {
        HistoryStore::open(&config.paths.history_db)?.recent(limit)?
    } else {
        Vec::new()
    };

    if json {
        let payload = serde_json::json!({ "command": "history", "alerts": alerts });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("no alerts recorded");
        return Ok(());
    }

    for record in &alerts {
        let severity = match record.severity {
            Severity::Critical => format!("{:<8}", "critical").red().bold(),
            Severity::Normal => format!("{:<8}", "normal").normal(),
        };
        let via = record.delivered_via.as_deref().unwrap_or("none");
        println!(
            "{}  {severity}  {}  ({} -> {}, via {via})",
            record.ts.format("%Y-%m-%d %H:%M:%SZ"),
            record.message,
            record.previous.as_str(),
            record.current.as_str(),
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// test-notify
// ---------------------------------------------------------------------------

fn run_test_notify(config_path: &Path) -> Result<()> {
    let config = load_or_scaffold(config_path)?;
    let dispatcher = Dispatcher::from_config(&config.notify);
    let event = AlertEvent {
        service: "uwd-test.service".to_string(),
        previous: ServiceState::Active,
        current: ServiceState::Failed,
        severity: Severity::Critical,
        message: "uwd-test.service has FAILED (test notification)".to_string(),
    };

    let result = dispatcher.dispatch(&event);
    for failure in &result.failures {
        eprintln!("uwd: {failure}");
    }
    match result.delivered_via {
        Some(sink) => {
            if result.degraded {
                println!("delivered via {sink} (primary sink unavailable)");
            } else {
                println!("delivered via {sink}");
            }
            Ok(())
        }
        None => Err(UwdError::DispatchFailed {
            details: result.failures.join("; "),
        }),
    }
}

// ---------------------------------------------------------------------------
// install / uninstall
// ---------------------------------------------------------------------------

fn run_install(
    config_path: &Path,
    dry_run: bool,
    no_enable: bool,
    no_register: bool,
) -> Result<()> {
    let opts = InstallOptions {
        config: load_or_scaffold(config_path)?,
        enable: !no_enable,
        register: !no_register,
        dry_run,
        ..Default::default()
    };
    if !dry_run {
        ensure_root(&opts.unit_path)?;
    }
    let report = install::run_install_sequence(&opts);
    print!("{}", format_install_report(&report));
    if report.success {
        Ok(())
    } else {
        Err(UwdError::Runtime {
            details: "install did not complete; see the report above".to_string(),
        })
    }
}

fn run_uninstall(
    config_path: &Path,
    dry_run: bool,
    keep_data: bool,
    keep_config: bool,
    no_register: bool,
) -> Result<()> {
    let paths = match Config::load(config_path) {
        Ok(config) => config.paths,
        Err(UwdError::MissingConfig { .. }) => Config::scaffold(config_path).paths,
        Err(e) => return Err(e),
    };
    let opts = UninstallOptions {
        keep_data,
        keep_config,
        register: !no_register,
        dry_run,
        paths,
        ..Default::default()
    };
    if !dry_run {
        ensure_root(&opts.unit_path)?;
    }
    let report = install::run_uninstall_sequence(&opts);
    print!("{}", format_uninstall_report(&report));
    if report.success {
        Ok(())
    } else {
        Err(UwdError::Runtime {
            details: "uninstall did not complete; see the report above".to_string(),
        })
    }
}

/// System installs touch /etc and /var; require root up front so the
/// sequence does not fail halfway through.
fn ensure_root(unit_path: &Path) -> Result<()> {
    if nix::unistd::Uid::effective().is_root() {
        return Ok(());
    }
    Err(UwdError::PermissionDenied {
        path: unit_path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// config / completions
// ---------------------------------------------------------------------------

fn run_config(config_path: &Path, sub: &ConfigCommand) -> Result<()> {
    match sub {
        ConfigCommand::Show => {
            let config = Config::load(config_path)?;
            let rendered =
                toml::to_string_pretty(&config).map_err(|e| UwdError::Serialization {
                    context: "toml",
                    details: e.to_string(),
                })?;
            print!("{rendered}");
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "uwd", &mut std::io::stdout());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_requires_at_least_one_unit() {
        let err = Cli::try_parse_from(["uwd", "add"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn global_config_flag_reaches_subcommands() {
        let cli = Cli::try_parse_from(["uwd", "status", "--config", "/tmp/uwd.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/uwd.toml")));
        assert!(matches!(cli.command, Command::Status { json: false }));
    }

    #[test]
    fn history_defaults_to_twenty_entries() {
        let cli = Cli::try_parse_from(["uwd", "history"]).unwrap();
        match cli.command {
            Command::History { limit, json } => {
                assert_eq!(limit, 20);
                assert!(!json);
            }
            _ => panic!("expected the history subcommand"),
        }
    }
}
