//! UWD-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, UwdError>;

/// Top-level error type for Unit Watchdog.
#[derive(Debug, Error)]
pub enum UwdError {
    #[error("[UWD-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[UWD-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[UWD-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[UWD-1004] no services configured; add one with `uwd add <unit>`")]
    NoServicesConfigured,

    #[error("[UWD-2001] service manager unreachable while probing {unit}: {details}")]
    ProbeUnavailable { unit: String, details: String },

    #[error("[UWD-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[UWD-2102] SQL failure in {context}: {details}")]
    Sql {
        context: &'static str,
        details: String,
    },

    #[error("[UWD-2201] notification dispatch failed: {details}")]
    DispatchFailed { details: String },

    #[error("[UWD-2301] service control failure: {details}")]
    ServiceControl { details: String },

    #[error("[UWD-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[UWD-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[UWD-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[UWD-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl UwdError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "UWD-1001",
            Self::MissingConfig { .. } => "UWD-1002",
            Self::ConfigParse { .. } => "UWD-1003",
            Self::NoServicesConfigured => "UWD-1004",
            Self::ProbeUnavailable { .. } => "UWD-2001",
            Self::Serialization { .. } => "UWD-2101",
            Self::Sql { .. } => "UWD-2102",
            Self::DispatchFailed { .. } => "UWD-2201",
            Self::ServiceControl { .. } => "UWD-2301",
            Self::PermissionDenied { .. } => "UWD-3001",
            Self::Io { .. } => "UWD-3002",
            Self::ChannelClosed { .. } => "UWD-3003",
            Self::Runtime { .. } => "UWD-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::ProbeUnavailable { .. }
                | Self::Sql { .. }
                | Self::DispatchFailed { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for UwdError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql {
            context: "rusqlite",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for UwdError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for UwdError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
