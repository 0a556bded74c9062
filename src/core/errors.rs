//! CST-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, StatusError>;

/// Top-level error type for the status surface.
///
/// None of these ever reach the render path: the surface degrades to a less
/// detailed instruction instead. They surface from config loading, the client
/// adapters, and the CLI.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("[CST-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CST-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CST-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CST-2001] client state unreadable at {path}: {details}")]
    ClientState { path: PathBuf, details: String },

    #[error("[CST-2002] battery probe failed: {details}")]
    BatteryProbe { details: String },

    #[error("[CST-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CST-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CST-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl StatusError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CST-1001",
            Self::MissingConfig { .. } => "CST-1002",
            Self::ConfigParse { .. } => "CST-1003",
            Self::ClientState { .. } => "CST-2001",
            Self::BatteryProbe { .. } => "CST-2002",
            Self::Serialization { .. } => "CST-2101",
            Self::Io { .. } => "CST-3002",
            Self::Runtime { .. } => "CST-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::ClientState { .. } | Self::BatteryProbe { .. }
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

impl From<serde_json::Error> for StatusError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for StatusError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
