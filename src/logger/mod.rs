//! Dual-write logging: SQLite (WAL) alert history + JSONL event journal
//! with graceful degradation.

pub mod dual;
pub mod jsonl;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::probe::ServiceState;
use crate::monitor::transition::{AlertEvent, Severity};
use crate::notify::DeliveryResult;

/// One alert as persisted: the transition plus the dispatch outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Observation timestamp.
    pub ts: DateTime<Utc>,
    /// The unit that transitioned.
    pub service: String,
    /// State before the transition.
    pub previous: ServiceState,
    /// State after the transition.
    pub current: ServiceState,
    /// Alert urgency.
    pub severity: Severity,
    /// The message handed to the sinks.
    pub message: String,
    /// Sink that accepted the alert, `None` when every sink refused.
    pub delivered_via: Option<String>,
}

impl AlertRecord {
    /// Stamp an event with the current time and its dispatch outcome.
    #[must_use]
    pub fn from_event(event: &AlertEvent, delivery: &DeliveryResult) -> Self {
        Self {
            ts: Utc::now(),
            service: event.service.clone(),
            previous: event.previous,
            current: event.current,
            severity: event.severity,
            message: event.message.clone(),
            delivered_via: delivery.delivered_via.map(str::to_owned),
        }
    }
}
