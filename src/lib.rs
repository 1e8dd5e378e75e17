//! Unit Watchdog: a single-host watchdog for systemd services.
//!
//! The daemon polls `systemctl` for every tracked unit, classifies the answer
//! into one of four states (active, failed, inactive, not-found), compares it
//! against the last known state, and raises a desktop alert on meaningful
//! transitions. Last-known states persist across restarts, so a failure that
//! happens while the watchdog itself is down still alerts on the next sweep.
//!
//! Module map:
//! - [`core`]: configuration and coded error types shared by everything else
//! - [`monitor`]: the systemctl probe and the transition classifier
//! - [`state`]: plain-text last-known-state store with atomic rewrites
//! - [`notify`]: notification sink chain with graceful degradation
//! - [`logger`]: SQLite alert history plus JSONL event journal
//! - [`daemon`]: the polling scheduler, signal handling, and the unit file
//! - [`cli`] / [`cli_app`]: install orchestration and the `uwd` command

pub mod core;
pub mod daemon;
pub mod logger;
pub mod monitor;
pub mod notify;
pub mod state;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod cli_app;
