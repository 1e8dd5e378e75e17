//! Transition classifier: the alerting policy as one pure function over the
//! closed state enum.
//!
//! Alerts are transition-triggered, never level-triggered: an event fires
//! only when the current state differs from a *known* previous state. The
//! first-ever observation of a service establishes a baseline and is always
//! silent, whatever the observed state.
//!
//! Policy table (previous → current ⇒ event, else none):
//!
//! | previous           | current  | severity | message           |
//! |--------------------|----------|----------|-------------------|
//! | Failed or Inactive | Active   | Normal   | recovered         |
//! | anything else      | Failed   | Critical | has FAILED        |
//! | anything else      | Inactive | Normal   | stopped           |
//! | anything else      | NotFound | Normal   | not found         |
//!
//! `NotFound → Active` intentionally matches no row: the table recognizes a
//! recovery only out of `Failed` or `Inactive`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::UwdError;
use crate::monitor::probe::ServiceState;

/// Alert urgency, mapped onto the notification backend's urgency levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something broke: a unit entered the failed state.
    Critical,
    /// Informational: recovery, stop, or disappearance.
    Normal,
}

impl Severity {
    /// Lowercase spelling used in history rows and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = UwdError;

    fn from_str(s: &str) -> Result<Self, UwdError> {
        match s {
            "critical" => Ok(Self::Critical),
            "normal" => Ok(Self::Normal),
            other => Err(UwdError::Serialization {
                context: "severity",
                details: format!("unrecognized severity {other:?}"),
            }),
        }
    }
}

/// One tracked transition, ready for dispatch. Ephemeral: produced by
/// [`classify_transition`], consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    /// The unit that transitioned.
    pub service: String,
    /// Last known state before this observation.
    pub previous: ServiceState,
    /// State observed now.
    pub current: ServiceState,
    /// Urgency of the event.
    pub severity: Severity,
    /// Human-readable one-liner, e.g. `web.service has FAILED`.
    pub message: String,
}

/// Classify one observation against the last known state.
///
/// `previous == None` is the baseline sentinel for a never-before-seen
/// service: no alert, whatever `current` is.
#[must_use]
pub fn classify_transition(
    service: &str,
    previous: Option<ServiceState>,
    current: ServiceState,
) -> Option<AlertEvent> {
    let previous = previous?;
    if previous == current {
        return None;
    }

    let (severity, message) = match current {
        ServiceState::Failed => (Severity::Critical, format!("{service} has FAILED")),
        ServiceState::Active => match previous {
            ServiceState::Failed | ServiceState::Inactive => {
                (Severity::Normal, format!("{service} recovered / now running"))
            }
            // No recognized recovery row for NotFound → Active.
            ServiceState::Active | ServiceState::NotFound => return None,
        },
        ServiceState::Inactive => (Severity::Normal, format!("{service} stopped")),
        ServiceState::NotFound => (Severity::Normal, format!("{service} not found")),
    };

    Some(AlertEvent {
        service: service.to_string(),
        previous,
        current,
        severity,
        message,
    })
}
