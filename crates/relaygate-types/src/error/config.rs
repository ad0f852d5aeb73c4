//! Settings-file errors.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cannot read settings from {path}: {message}")]
    Read { path: String, message: String },

    #[error("settings file {path} is not valid JSON: {message}")]
    Parse { path: String, message: String },

    /// A value is out of range; `field` is the settings key.
    #[error("invalid setting `{field}`: {message}")]
    Invalid { field: String, message: String },

    #[error("cannot write settings to {path}: {message}")]
    Write { path: String, message: String },
}

impl ConfigError {
    pub fn read(path: &Path, e: &std::io::Error) -> Self {
        Self::Read { path: path.display().to_string(), message: e.to_string() }
    }

    pub fn parse(path: &Path, e: &serde_json::Error) -> Self {
        Self::Parse { path: path.display().to_string(), message: e.to_string() }
    }

    pub fn write(path: &Path, e: impl std::fmt::Display) -> Self {
        Self::Write { path: path.display().to_string(), message: e.to_string() }
    }
}
