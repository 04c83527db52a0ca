//! Error types for discovery.
//!
//! Only [`DiscoverError`] ever reaches the caller of a discovery run.
//! [`ProcessError`] is produced by the process capability and is always
//! absorbed by the probe or listing that triggered it.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single external invocation.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be found on `PATH`.
    #[error("program '{program}' not found")]
    NotFound { program: String },

    /// The program ran past its deadline and produced no usable output.
    #[error("'{program}' timed out after {}ms", .timeout.as_millis())]
    Timeout { program: String, timeout: Duration },

    /// The program exited unsuccessfully and output was not accepted.
    #[error("'{program}' exited with status {}", display_code(.code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stdout: String,
    },

    /// Spawning failed for a reason other than a missing binary.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child failed.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in '{}': {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Fatal error for a discovery run.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// No target program was given and none is configured.
    #[error(
        "no target program to inspect: pass one (e.g. `climb discover git`) \
         or set `target_program` in the config file / CLIMB_TARGET"
    )]
    MissingTarget,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
