//! Desktop-notification sink backed by `notify-send`.
//!
//! A missing `notify-send` binary is reported as [`SinkError::Unavailable`]
//! so the dispatcher can fall through to its fallback without raising; any
//! other failure (no session bus, non-zero exit) is [`SinkError::Failed`].

use std::process::Command;

use crate::monitor::transition::{AlertEvent, Severity};
use crate::notify::{NotifySink, SinkError};

/// Desktop popup sink.
#[derive(Debug, Clone)]
pub struct DesktopSink {
    app_name: String,
}

impl DesktopSink {
    /// Sink announcing itself to the notification daemon as `app_name`.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl NotifySink for DesktopSink {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn deliver(&self, event: &AlertEvent) -> Result<(), SinkError> {
        let output = Command::new("notify-send")
            .arg(format!("--urgency={}", urgency_flag(event.severity)))
            .arg(format!("--app-name={}", self.app_name))
            .arg(notification_title(&self.app_name, event))
            .arg(notification_body(event))
            .output();

        match output {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SinkError::Unavailable),
            Err(e) => Err(SinkError::Failed(format!("notify-send failed: {e}"))),
            Ok(out) if !out.status.success() => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                Err(SinkError::Failed(format!(
                    "notify-send exited with {}: {}",
                    out.status,
                    stderr.trim()
                )))
            }
            Ok(_) => Ok(()),
        }
    }
}

/// Map alert severity onto notify-send urgency levels.
#[must_use]
pub const fn urgency_flag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::Normal => "normal",
    }
}

fn notification_title(app_name: &str, event: &AlertEvent) -> String {
    format!("{app_name}: {}", event.service)
}

fn notification_body(event: &AlertEvent) -> String {
    format!(
        "{} ({} -> {})",
        event.message, event.previous, event.current
    )
}
