//! File-backed map from service name to last-observed state.
//!
//! The whole file is rewritten on every update via write-to-temp + fsync +
//! atomic rename, so writing one record can never destroy or duplicate
//! another record, and readers always see a complete file. The store does no
//! locking of its own: the scheduler is the single writer.
//!
//! Failure posture follows the availability-first policy: a missing backing
//! file is an empty store; unreadable lines are skipped and counted; a
//! persist failure leaves the in-memory value in place so the running
//! process keeps classifying against the freshest observation.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, UwdError};
use crate::monitor::probe::ServiceState;
use crate::state::format;

/// Durable `service -> last observed state` map.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    entries: BTreeMap<String, ServiceState>,
    skipped_lines: usize,
}

impl StateStore {
    /// Open the store at `path`, loading any existing records. A missing
    /// file is an empty store; an unreadable file is an error the caller
    /// may downgrade via [`StateStore::empty`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            path: path.clone(),
            entries: BTreeMap::new(),
            skipped_lines: 0,
        };

        if !path.exists() {
            return Ok(store);
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| UwdError::io(&path, e))?;
        for line in raw.lines() {
            match format::parse_line(line) {
                Some((service, state)) => {
                    // Duplicate keys should not occur; last write wins if
                    // an external editor left some behind.
                    store.entries.insert(service.to_string(), state);
                }
                None if line.trim().is_empty() => {}
                None => store.skipped_lines += 1,
            }
        }
        Ok(store)
    }

    /// An empty store over `path`, for callers recovering from a read
    /// failure: baselines re-seed on the next cycle.
    #[must_use]
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: BTreeMap::new(),
            skipped_lines: 0,
        }
    }

    /// Last observed state for `service`; `None` means never observed.
    #[must_use]
    pub fn get(&self, service: &str) -> Option<ServiceState> {
        self.entries.get(service).copied()
    }

    /// Upsert the record for `service` and persist the whole map. The
    /// in-memory value is updated even when persistence fails, so a running
    /// scheduler keeps using the freshest observation.
    pub fn set(&mut self, service: &str, state: ServiceState) -> Result<()> {
        self.entries.insert(service.to_string(), state);
        self.persist()
    }

    /// All records, ordered by service name.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, ServiceState> {
        &self.entries
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unreadable lines encountered while loading, surfaced for logging.
    #[must_use]
    pub const fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| UwdError::io(parent, e))?;
        }

        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "state".to_string(), |n| n.to_string_lossy().into_owned());
        let tmp = self.path.with_file_name(format!("{file_name}.tmp"));

        let mut file = std::fs::File::create(&tmp).map_err(|e| UwdError::io(&tmp, e))?;
        for (service, state) in &self.entries {
            writeln!(file, "{}", format::render_line(service, *state))
                .map_err(|e| UwdError::io(&tmp, e))?;
        }
        file.sync_all().map_err(|e| UwdError::io(&tmp, e))?;
        drop(file);

        std::fs::rename(&tmp, &self.path).map_err(|e| UwdError::io(&self.path, e))
    }
}
