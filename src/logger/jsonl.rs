//! Append-only JSONL event journal.
//!
//! One JSON object per line, flushed per event, so a crash loses at most the
//! line being written. The journal carries lifecycle events and faults, not
//! just alerts; it is the place to look when asking what the daemon did
//! overnight.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, UwdError};

/// Category tag for journal lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// The monitoring loop is about to start.
    MonitorStarted,
    /// Initial sweep observed a service already present in the state file.
    StartingStatus,
    /// Initial sweep recorded a first-ever observation.
    Baseline,
    /// A state change was detected and an alert was produced.
    Transition,
    /// The service manager could not be queried for one unit this cycle.
    ProbeFault,
    /// The state file could not be rewritten.
    StoreFault,
    /// Every notification sink refused an alert.
    DispatchFault,
    /// Clean shutdown.
    MonitorStopped,
}

/// One journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the event happened.
    pub ts: DateTime<Utc>,
    /// Category tag.
    pub kind: EventKind,
    /// Unit concerned, when the event is about one unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Free-form detail line.
    pub detail: String,
}

impl LogEvent {
    /// Event stamped with the current time.
    #[must_use]
    pub fn now(kind: EventKind, service: Option<&str>, detail: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            kind,
            service: service.map(str::to_owned),
            detail: detail.into(),
        }
    }
}

/// Append-only journal handle.
#[derive(Debug)]
pub struct JsonlLog {
    path: PathBuf,
    file: File,
}

impl JsonlLog {
    /// Open (or create) the journal at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| UwdError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| UwdError::io(&path, e))?;
        Ok(Self { path, file })
    }

    /// Append one event as a single JSON line and flush it.
    pub fn append(&mut self, event: &LogEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(self.file, "{line}").map_err(|e| UwdError::io(&self.path, e))?;
        self.file.flush().map_err(|e| UwdError::io(&self.path, e))
    }

    /// Journal location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read a whole journal back. Unparseable lines are skipped: a torn final
/// line must not make the rest of the journal unreadable.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<LogEvent>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| UwdError::io(path, e))?;
    let mut events = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| UwdError::io(path, e))?;
        if let Ok(event) = serde_json::from_str::<LogEvent>(&line) {
            events.push(event);
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::{EventKind, JsonlLog, LogEvent, read_events};
    use tempfile::TempDir;

    #[test]
    fn events_append_and_read_back_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("events.jsonl");

        let mut log = JsonlLog::open(&path).unwrap();
        log.append(&LogEvent::now(EventKind::MonitorStarted, None, "interval 30s"))
            .unwrap();
        log.append(&LogEvent::now(
            EventKind::Baseline,
            Some("web.service"),
            "baseline active",
        ))
        .unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::MonitorStarted);
        assert_eq!(events[1].kind, EventKind::Baseline);
        assert_eq!(events[1].service.as_deref(), Some("web.service"));
    }

    #[test]
    fn kinds_serialize_kebab_case() {
        let line =
            serde_json::to_string(&LogEvent::now(EventKind::ProbeFault, Some("db.service"), "x"))
                .unwrap();
        assert!(line.contains("\"probe-fault\""), "{line}");
    }

    #[test]
    fn torn_trailing_line_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("events.jsonl");

        let mut log = JsonlLog::open(&path).unwrap();
        log.append(&LogEvent::now(EventKind::MonitorStopped, None, "bye"))
            .unwrap();
        drop(log);

        use std::io::Write as _;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"ts\":\"2026-01-").unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MonitorStopped);
    }

    #[test]
    fn reopening_appends_rather_than_truncates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("events.jsonl");

        JsonlLog::open(&path)
            .unwrap()
            .append(&LogEvent::now(EventKind::MonitorStarted, None, "first run"))
            .unwrap();
        JsonlLog::open(&path)
            .unwrap()
            .append(&LogEvent::now(EventKind::MonitorStarted, None, "second run"))
            .unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
    }
}
