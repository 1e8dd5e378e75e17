//! Notification dispatch: an ordered chain of sinks with graceful
//! degradation.
//!
//! The dispatcher walks its sinks in order and stops at the first success.
//! A sink whose capability is absent on the host (no `notify-send` binary)
//! reports [`SinkError::Unavailable`] and the chain falls through to the
//! next sink. Dispatch itself never fails: the worst outcome is a
//! [`DeliveryResult`] that says nothing was delivered, which the scheduler
//! logs and survives.

pub mod desktop;
pub mod log_sink;

pub use desktop::DesktopSink;
pub use log_sink::LogSink;

use crate::core::config::NotifyConfig;
use crate::monitor::transition::AlertEvent;

/// Why a sink did not deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The delivery capability is not present on this host.
    Unavailable,
    /// The capability exists but delivery failed.
    Failed(String),
}

/// One notification delivery backend in the dispatcher's ordered chain.
pub trait NotifySink {
    /// Short stable name recorded in history rows (`desktop`, `log`).
    fn name(&self) -> &'static str;

    /// Attempt delivery of one event.
    fn deliver(&self, event: &AlertEvent) -> Result<(), SinkError>;
}

/// Outcome of one dispatch. Never an error: failures are data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Name of the sink that delivered, or `None` if every sink failed.
    pub delivered_via: Option<&'static str>,
    /// True when the first-choice sink did not deliver.
    pub degraded: bool,
    /// Per-sink failure notes, in attempt order.
    pub failures: Vec<String>,
}

impl DeliveryResult {
    /// Whether any sink accepted the event.
    #[must_use]
    pub const fn delivered(&self) -> bool {
        self.delivered_via.is_some()
    }
}

/// Walks the sink chain for each event.
pub struct Dispatcher {
    sinks: Vec<Box<dyn NotifySink>>,
}

impl Dispatcher {
    /// Build a dispatcher over an explicit sink chain, first choice first.
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn NotifySink>>) -> Self {
        Self { sinks }
    }

    /// The production chain: desktop first (when enabled), log line as the
    /// always-available fallback.
    #[must_use]
    pub fn from_config(notify: &NotifyConfig) -> Self {
        let mut sinks: Vec<Box<dyn NotifySink>> = Vec::with_capacity(2);
        if notify.desktop {
            sinks.push(Box::new(DesktopSink::new(notify.app_name.clone())));
        }
        sinks.push(Box::new(LogSink));
        Self::new(sinks)
    }

    /// Attempt delivery through the chain, stopping at the first success.
    #[must_use]
    pub fn dispatch(&self, event: &AlertEvent) -> DeliveryResult {
        let mut failures = Vec::new();
        for (index, sink) in self.sinks.iter().enumerate() {
            match sink.deliver(event) {
                Ok(()) => {
                    return DeliveryResult {
                        delivered_via: Some(sink.name()),
                        degraded: index > 0,
                        failures,
                    };
                }
                Err(SinkError::Unavailable) => {
                    failures.push(format!("{}: unavailable", sink.name()));
                }
                Err(SinkError::Failed(details)) => {
                    failures.push(format!("{}: {details}", sink.name()));
                }
            }
        }
        DeliveryResult {
            delivered_via: None,
            degraded: true,
            failures,
        }
    }

    /// Number of sinks in the chain.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}
