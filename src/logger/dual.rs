//! Dual-write facade: alerts go to the SQLite history and are mirrored into
//! the JSONL journal; lifecycle events go to the journal only.
//!
//! Either backend may fail to open or start failing mid-run. Writes degrade
//! to the surviving backend, the first failure per backend is reported once
//! on stderr, and no logging failure ever reaches the monitoring loop as an
//! error.

use parking_lot::Mutex;

use crate::core::config::PathsConfig;
use crate::logger::AlertRecord;
use crate::logger::jsonl::{EventKind, JsonlLog, LogEvent};
#[cfg(feature = "sqlite")]
use crate::logger::sqlite::HistoryStore;

/// Shared, internally synchronized logging facade.
#[derive(Debug)]
pub struct DualLogger {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    journal: Option<JsonlLog>,
    journal_warned: bool,
    #[cfg(feature = "sqlite")]
    history: Option<HistoryStore>,
    #[cfg(feature = "sqlite")]
    history_warned: bool,
}

impl DualLogger {
    /// Open both backends at the configured paths. A backend that fails to
    /// open is reported on stderr and skipped; this constructor never fails.
    #[must_use]
    pub fn open(paths: &PathsConfig) -> Self {
        let journal = match JsonlLog::open(&paths.events_log) {
            Ok(log) => Some(log),
            Err(e) => {
                eprintln!("uwd: event journal disabled: {e}");
                None
            }
        };
        #[cfg(feature = "sqlite")]
        let history = match HistoryStore::open(&paths.history_db) {
            Ok(store) => Some(store),
            Err(e) => {
                eprintln!("uwd: alert history disabled: {e}");
                None
            }
        };
        Self {
            inner: Mutex::new(Inner {
                journal,
                journal_warned: false,
                #[cfg(feature = "sqlite")]
                history,
                #[cfg(feature = "sqlite")]
                history_warned: false,
            }),
        }
    }

    /// A logger with no backends, for one-shot commands and tests that must
    /// not touch the filesystem.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            inner: Mutex::new(Inner {
                journal: None,
                journal_warned: false,
                #[cfg(feature = "sqlite")]
                history: None,
                #[cfg(feature = "sqlite")]
                history_warned: false,
            }),
        }
    }

    /// Append a lifecycle event to the journal. Best-effort.
    pub fn event(&self, event: &LogEvent) {
        self.inner.lock().append_journal(event);
    }

    /// Record one alert in the history database and mirror it into the
    /// journal as a transition event. Best-effort on both backends.
    pub fn alert(&self, record: &AlertRecord) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        #[cfg(feature = "sqlite")]
        if let Some(history) = &inner.history {
            if let Err(e) = history.record(record) {
                if !inner.history_warned {
                    eprintln!("uwd: alert history degraded: {e}");
                    inner.history_warned = true;
                }
            }
        }

        let detail = match &record.delivered_via {
            Some(sink) => format!("{} (delivered via {sink})", record.message),
            None => format!("{} (delivery failed)", record.message),
        };
        inner.append_journal(&LogEvent {
            ts: record.ts,
            kind: EventKind::Transition,
            service: Some(record.service.clone()),
            detail,
        });
    }

    /// Whether any backend is missing or has failed since opening.
    #[must_use]
    pub fn degraded(&self) -> bool {
        let inner = self.inner.lock();
        let journal_down = inner.journal.is_none() || inner.journal_warned;
        #[cfg(feature = "sqlite")]
        {
            journal_down || inner.history.is_none() || inner.history_warned
        }
        #[cfg(not(feature = "sqlite"))]
        {
            journal_down
        }
    }
}

impl Inner {
    fn append_journal(&mut self, event: &LogEvent) {
        if let Some(journal) = &mut self.journal {
            if let Err(e) = journal.append(event) {
                if !self.journal_warned {
                    eprintln!("uwd: event journal degraded: {e}");
                    self.journal_warned = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DualLogger;
    use crate::core::config::PathsConfig;
    use crate::logger::AlertRecord;
    use crate::logger::jsonl::{EventKind, LogEvent, read_events};
    use crate::monitor::probe::ServiceState;
    use crate::monitor::transition::Severity;
    use chrono::Utc;
    use tempfile::TempDir;

    fn paths_in(dir: &std::path::Path) -> PathsConfig {
        PathsConfig {
            config_file: dir.join("config.toml"),
            state_file: dir.join("state"),
            history_db: dir.join("history.db"),
            events_log: dir.join("events.jsonl"),
        }
    }

    fn sample_alert() -> AlertRecord {
        AlertRecord {
            ts: Utc::now(),
            service: "web.service".to_string(),
            previous: ServiceState::Active,
            current: ServiceState::Failed,
            severity: Severity::Critical,
            message: "web.service has FAILED".to_string(),
            delivered_via: Some("desktop".to_string()),
        }
    }

    #[test]
    fn alert_reaches_both_backends() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path());

        let log = DualLogger::open(&paths);
        log.event(&LogEvent::now(EventKind::MonitorStarted, None, "up"));
        log.alert(&sample_alert());
        assert!(!log.degraded());
        drop(log);

        let events = read_events(&paths.events_log).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::MonitorStarted);
        assert_eq!(events[1].kind, EventKind::Transition);
        assert!(events[1].detail.contains("delivered via desktop"));

        #[cfg(feature = "sqlite")]
        {
            let store = crate::logger::sqlite::HistoryStore::open(&paths.history_db).unwrap();
            assert_eq!(store.count().unwrap(), 1);
        }
    }

    #[test]
    #[cfg(feature = "sqlite")]
    fn unopenable_history_degrades_but_journal_survives() {
        let tmp = TempDir::new().unwrap();
        let mut paths = paths_in(tmp.path());
        // A directory at the database path makes the open fail.
        paths.history_db = tmp.path().join("blocked");
        std::fs::create_dir(&paths.history_db).unwrap();

        let log = DualLogger::open(&paths);
        assert!(log.degraded());
        log.alert(&sample_alert());
        drop(log);

        let events = read_events(&paths.events_log).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Transition);
    }

    #[test]
    fn disabled_logger_swallows_everything() {
        let log = DualLogger::disabled();
        log.event(&LogEvent::now(EventKind::MonitorStopped, None, "bye"));
        log.alert(&sample_alert());
        assert!(log.degraded());
    }

    #[test]
    fn undelivered_alert_is_marked_in_the_journal() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path());

        let log = DualLogger::open(&paths);
        let mut alert = sample_alert();
        alert.delivered_via = None;
        log.alert(&alert);
        drop(log);

        let events = read_events(&paths.events_log).unwrap();
        assert!(events[0].detail.contains("delivery failed"), "{}", events[0].detail);
    }
}
