//! # Error Types
//!
//! Fatal configuration problems and non-fatal spawn failures. Everything
//! else travels as `anyhow::Error` with context attached at the call site.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A configuration problem that must stop the launcher before the UI starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layout token matched no command label.
    #[error("could not find command key: {token}")]
    UnresolvedKey { token: String },

    /// A layout file was named explicitly but is not on disk.
    #[error("layout file {} does not exist", path.display())]
    MissingLayoutFile { path: PathBuf },

    /// A config file was named explicitly but is not on disk.
    #[error("could not find config at: {}", path.display())]
    MissingConfigFile { path: PathBuf },

    /// The layout token pattern failed to compile.
    #[error("failed to compile layout token pattern: {0}")]
    TokenPattern(#[source] regex::Error),
}

/// Failure to start a child process. Never fatal; the launcher records it
/// and carries on.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("cannot run an empty argument vector")]
    EmptyCommand,

    #[error("failed to spawn `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}
