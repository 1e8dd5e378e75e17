//! SQLite-backed alert history, WAL mode.
//!
//! One row per alert, append-only from the daemon's point of view. WAL plus
//! a busy timeout lets `uwd history` read the database while the daemon
//! holds its own connection open.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::core::errors::{Result, UwdError};
use crate::logger::AlertRecord;

/// Durable alert history.
#[derive(Debug)]
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (or create) the history database, switch it to WAL, and create
    /// the schema when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| UwdError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(2))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             CREATE TABLE IF NOT EXISTS alert_history (
                 id             INTEGER PRIMARY KEY AUTOINCREMENT,
                 ts_utc         TEXT NOT NULL,
                 service        TEXT NOT NULL,
                 previous_state TEXT NOT NULL,
                 current_state  TEXT NOT NULL,
                 severity       TEXT NOT NULL,
                 message        TEXT NOT NULL,
                 delivered_via  TEXT
             );",
        )?;
        Ok(Self { conn })
    }

    /// Insert one alert row.
    pub fn record(&self, record: &AlertRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO alert_history
                 (ts_utc, service, previous_state, current_state, severity, message, delivered_via)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.ts.to_rfc3339(),
                record.service,
                record.previous.as_str(),
                record.current.as_str(),
                record.severity.as_str(),
                record.message,
                record.delivered_via,
            ],
        )?;
        Ok(())
    }

    /// Newest alerts first, up to `limit`.
    pub fn recent(&self, limit: usize) -> Result<Vec<AlertRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT ts_utc, service, previous_state, current_state, severity, message,
                    delivered_via
             FROM alert_history ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (ts, service, previous, current, severity, message, delivered_via) = row?;
            records.push(AlertRecord {
                ts: parse_ts(&ts)?,
                service,
                previous: previous.parse()?,
                current: current.parse()?,
                severity: severity.parse()?,
                message,
                delivered_via,
            });
        }
        Ok(records)
    }

    /// Total number of alerts ever recorded.
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM alert_history", [], |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| UwdError::Serialization {
            context: "timestamp",
            details: format!("bad ts_utc {raw:?}: {e}"),
        })
}
