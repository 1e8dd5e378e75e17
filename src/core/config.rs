//! TOML-backed configuration: tracked services, polling interval,
//! notification settings, and on-disk paths.
//!
//! Everything the scheduler needs is constructed from this value at process
//! start; nothing reads configuration ambiently after that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, UwdError};

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monitoring loop settings.
    pub monitor: MonitorConfig,
    /// Notification sink settings.
    pub notify: NotifyConfig,
    /// File locations.
    pub paths: PathsConfig,
}

/// Monitoring loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between checking cycles.
    pub interval_secs: u64,
    /// Tracked unit names, in check and display order.
    pub services: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            services: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Polling interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Track a unit. Returns `false` when it was already tracked.
    pub fn add_service(&mut self, unit: &str) -> bool {
        if self.services.iter().any(|s| s == unit) {
            return false;
        }
        self.services.push(unit.to_string());
        true
    }

    /// Stop tracking a unit. Returns `false` when it was not tracked.
    pub fn remove_service(&mut self, unit: &str) -> bool {
        let before = self.services.len();
        self.services.retain(|s| s != unit);
        self.services.len() != before
    }
}

/// Notification sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Whether the desktop-notification sink is attempted at all.
    pub desktop: bool,
    /// Application name shown by the desktop notifier.
    pub app_name: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            app_name: "uwd".to_string(),
        }
    }
}

/// File locations for config, durable state, and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// The config file itself (rewritten by `uwd add`/`uwd remove`).
    pub config_file: PathBuf,
    /// Durable last-known-state map, one `name:state` line per service.
    pub state_file: PathBuf,
    /// SQLite alert history database.
    pub history_db: PathBuf,
    /// Append-only JSONL event journal.
    pub events_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("/etc/uwd/config.toml"),
            state_file: PathBuf::from("/var/lib/uwd/state"),
            history_db: PathBuf::from("/var/lib/uwd/history.db"),
            events_log: PathBuf::from("/var/lib/uwd/events.jsonl"),
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

impl Config {
    /// Default system-wide config location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("/etc/uwd/config.toml")
    }

    /// A fresh config rooted at `path`: data files live next to the config
    /// file so a `--config /tmp/x/config.toml` run is fully self-contained.
    /// Scaffolding the default path yields the stock system layout.
    #[must_use]
    pub fn scaffold(path: &Path) -> Self {
        if path == Self::default_path() {
            return Self::default();
        }
        let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        Self {
            paths: PathsConfig {
                config_file: path.to_path_buf(),
                state_file: dir.join("state"),
                history_db: dir.join("history.db"),
                events_log: dir.join("events.jsonl"),
            },
            ..Self::default()
        }
    }

    /// Load and validate a config file. A missing file is
    /// [`UwdError::MissingConfig`]; the loaded value records the path it
    /// came from in `paths.config_file`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(UwdError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|e| UwdError::io(path, e))?;
        let mut config: Self = toml::from_str(&raw)?;
        config.paths.config_file = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Serialize and write the config to `paths.config_file`, creating
    /// parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = &self.paths.config_file;
        let rendered = toml::to_string_pretty(self).map_err(|e| UwdError::Serialization {
            context: "toml",
            details: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| UwdError::io(parent, e))?;
        }
        std::fs::write(path, rendered).map_err(|e| UwdError::io(path, e))
    }

    /// Structural validation shared by load and save.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(UwdError::InvalidConfig {
                details: "monitor.interval_secs must be at least 1".to_string(),
            });
        }
        for unit in &self.monitor.services {
            validate_unit_name(unit)?;
        }
        let mut seen = std::collections::HashSet::new();
        for unit in &self.monitor.services {
            if !seen.insert(unit.as_str()) {
                return Err(UwdError::InvalidConfig {
                    details: format!("service {unit:?} is listed more than once"),
                });
            }
        }
        Ok(())
    }
}

/// Reject names the service manager could never address. Colons are legal
/// in systemd unit names and are handled by the state-file codec.
pub fn validate_unit_name(unit: &str) -> Result<()> {
    if unit.is_empty() {
        return Err(UwdError::InvalidConfig {
            details: "service name must not be empty".to_string(),
        });
    }
    if unit.chars().any(char::is_whitespace) || unit.contains('/') {
        return Err(UwdError::InvalidConfig {
            details: format!("service name {unit:?} contains whitespace or '/'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, PathsConfig, validate_unit_name};
    use tempfile::TempDir;

    #[test]
    fn roundtrip_through_file_preserves_services() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = Config::scaffold(&path);
        assert!(config.monitor.add_service("nginx.service"));
        assert!(config.monitor.add_service("postgresql.service"));
        assert!(!config.monitor.add_service("nginx.service"));
        config.save().unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(
            loaded.monitor.services,
            vec!["nginx.service", "postgresql.service"]
        );
        assert_eq!(loaded.monitor.interval_secs, 30);
        assert_eq!(loaded.paths.config_file, path);
    }

    #[test]
    fn scaffold_roots_data_files_next_to_config() {
        let config = Config::scaffold(std::path::Path::new("/tmp/watch/config.toml"));
        assert_eq!(
            config.paths.state_file,
            std::path::PathBuf::from("/tmp/watch/state")
        );
        assert_eq!(
            config.paths.history_db,
            std::path::PathBuf::from("/tmp/watch/history.db")
        );
    }

    #[test]
    fn scaffold_at_default_path_keeps_system_layout() {
        let config = Config::scaffold(&Config::default_path());
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn missing_file_is_a_distinct_error() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("nope.toml")).unwrap_err();
        assert_eq!(err.code(), "UWD-1002");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[monitor]\ninterval_secs = 0\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.code(), "UWD-1001");
    }

    #[test]
    fn duplicate_services_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[monitor]\nservices = [\"web.service\", \"web.service\"]\n",
        )
        .unwrap();
        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.code(), "UWD-1001");
    }

    #[test]
    fn unit_name_validation_allows_systemd_shapes() {
        assert!(validate_unit_name("nginx.service").is_ok());
        assert!(validate_unit_name("getty@tty1.service").is_ok());
        assert!(validate_unit_name("systemd-fsck@dev-sda1.service").is_ok());
        assert!(validate_unit_name("").is_err());
        assert!(validate_unit_name("has space").is_err());
        assert!(validate_unit_name("path/like").is_err());
    }

    #[test]
    fn remove_service_reports_absence() {
        let mut config = Config::default();
        config.monitor.add_service("a.service");
        assert!(config.monitor.remove_service("a.service"));
        assert!(!config.monitor.remove_service("a.service"));
    }
}
