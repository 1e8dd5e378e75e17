//! Daemon subsystem: monitoring loop, systemd service integration, signal
//! handling.

pub mod loop_main;
pub mod service;
#[cfg(feature = "daemon")]
pub mod signals;
