//! Fatal configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or JSON.
    #[error("invalid config file {path}: {message}")]
    ParseFile {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The `.env` file could not be read or parsed.
    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        /// Env file path.
        path: PathBuf,
        /// Underlying dotenvy error.
        #[source]
        source: dotenvy::Error,
    },

    /// No root configured and no platform data directory.
    #[error(
        "no storage root configured and no platform data directory available"
    )]
    NoStorageRoot,

    /// The directory name is not a single path segment.
    #[error("invalid cache directory name {name:?}")]
    InvalidDirectoryName {
        /// Rejected name.
        name: String,
    },
}
