//! Unit status probe: query the service manager for one unit and classify
//! the reply into a [`ServiceState`].
//!
//! The manager is an opaque capability behind [`UnitQuery`]; production code
//! uses [`Systemctl`], tests substitute scripted fakes. Probing is read-only
//! and performs no retries. A manager that cannot be queried at all is a
//! [`UwdError::ProbeUnavailable`], never a `NotFound` classification.

use std::fmt;
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, UwdError};

// ──────────────────── classified states ────────────────────

/// Classified operational status of one unit at one observation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceState {
    /// The manager reports the unit as currently running.
    Active,
    /// The unit is in a failed terminal state.
    Failed,
    /// Known to the manager, not running, not failed.
    Inactive,
    /// The manager has no knowledge of the unit.
    NotFound,
}

impl ServiceState {
    /// Every state, in classification-priority order. Useful for exhaustive
    /// table tests.
    pub const ALL: [Self; 4] = [Self::NotFound, Self::Active, Self::Failed, Self::Inactive];

    /// Canonical lowercase spelling used in the state file and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Failed => "failed",
            Self::Inactive => "inactive",
            Self::NotFound => "not-found",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceState {
    type Err = UwdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "failed" => Ok(Self::Failed),
            "inactive" => Ok(Self::Inactive),
            "not-found" => Ok(Self::NotFound),
            other => Err(UwdError::Serialization {
                context: "service-state",
                details: format!("unrecognized state {other:?}"),
            }),
        }
    }
}

// ──────────────────── manager capability ────────────────────

/// Raw tri-state answer from the service manager for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitFacts {
    /// The manager knows the unit at all.
    pub exists: bool,
    /// The unit is currently running.
    pub active: bool,
    /// The unit is in a failed terminal state.
    pub failed: bool,
}

impl UnitFacts {
    /// Facts that classify to exactly `state`. Right inverse of
    /// [`classify_unit`]; used by scripted fakes.
    #[must_use]
    pub const fn for_state(state: ServiceState) -> Self {
        match state {
            ServiceState::Active => Self {
                exists: true,
                active: true,
                failed: false,
            },
            ServiceState::Failed => Self {
                exists: true,
                active: false,
                failed: true,
            },
            ServiceState::Inactive => Self {
                exists: true,
                active: false,
                failed: false,
            },
            ServiceState::NotFound => Self {
                exists: false,
                active: false,
                failed: false,
            },
        }
    }
}

/// Opaque "query status of unit X" capability.
pub trait UnitQuery {
    /// Fetch the raw facts for `unit`. Errors mean the manager could not be
    /// queried, not that the unit is unknown.
    fn query_unit(&self, unit: &str) -> Result<UnitFacts>;
}

/// Classify raw facts into a state. Priority order matters: a unit that is
/// both "not active" and "failed" resolves to `Failed`, never `Inactive`.
#[must_use]
pub const fn classify_unit(facts: UnitFacts) -> ServiceState {
    if !facts.exists {
        ServiceState::NotFound
    } else if facts.active {
        ServiceState::Active
    } else if facts.failed {
        ServiceState::Failed
    } else {
        ServiceState::Inactive
    }
}

/// Probe one unit: query the manager and classify the answer.
pub fn probe(query: &dyn UnitQuery, unit: &str) -> Result<ServiceState> {
    Ok(classify_unit(query.query_unit(unit)?))
}

// ──────────────────── systemctl backend ────────────────────

/// Production [`UnitQuery`] backed by `systemctl show`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Systemctl;

impl UnitQuery for Systemctl {
    fn query_unit(&self, unit: &str) -> Result<UnitFacts> {
        let output = Command::new("systemctl")
            .args(["show", unit, "--property=LoadState,ActiveState", "--no-pager"])
            .output()
            .map_err(|e| UwdError::ProbeUnavailable {
                unit: unit.to_string(),
                details: format!("failed to run systemctl: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        // Some systemd versions exit non-zero for unknown units while still
        // printing LoadState=not-found; trust parseable output over the code.
        if let Some(facts) = facts_from_show_output(&stdout) {
            return Ok(facts);
        }

        let detail = if output.status.success() {
            format!("unparseable systemctl reply: {stdout:?}")
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            format!("systemctl exited with {}: {}", output.status, stderr.trim())
        };
        Err(UwdError::ProbeUnavailable {
            unit: unit.to_string(),
            details: detail,
        })
    }
}

/// Parse `systemctl show --property=LoadState,ActiveState` output.
/// Returns `None` when the reply carries no `LoadState` line at all.
fn facts_from_show_output(stdout: &str) -> Option<UnitFacts> {
    let mut load_state: Option<&str> = None;
    let mut active_state: Option<&str> = None;

    for line in stdout.lines() {
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "LoadState" => load_state = Some(value.trim()),
                "ActiveState" => active_state = Some(value.trim()),
                _ => {}
            }
        }
    }

    let load_state = load_state?;
    let active_state = active_state.unwrap_or("inactive");
    Some(UnitFacts {
        exists: load_state != "not-found",
        active: active_state == "active",
        failed: active_state == "failed",
    })
}
