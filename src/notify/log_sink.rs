//! Always-available fallback sink: one structured line on stderr, where a
//! supervising service manager will capture it.

use crate::monitor::transition::AlertEvent;
use crate::notify::{NotifySink, SinkError};

/// Log-line sink. Delivery cannot fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotifySink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn deliver(&self, event: &AlertEvent) -> Result<(), SinkError> {
        eprintln!("{}", render_line(event));
        Ok(())
    }
}

/// The stderr line for one alert.
#[must_use]
pub fn render_line(event: &AlertEvent) -> String {
    format!(
        "uwd alert [{}] {} ({} -> {})",
        event.severity, event.message, event.previous, event.current
    )
}
