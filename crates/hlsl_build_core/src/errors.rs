//! Error Types
//!
//! This module defines the error types used by the build driver.
//!
//! # Overview
//!
//! There are two distinct failure domains:
//!
//! - [`BuildError`] covers failures *outside* any compile task: the source
//!   tree cannot be walked, the configuration cannot be read or is invalid.
//!   These abort the whole run because no task list can be formed.
//! - [`CompileFailure`] covers failures *inside* a single compile task. These
//!   never propagate; they are recorded in the task's
//!   [`CompileOutcome`](crate::task::CompileOutcome) and only count towards the
//!   final verdict.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hlsl_build_core::errors::{BuildError, Result};
//!
//! fn load() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal errors of a build run.
#[derive(Error, Debug)]
pub enum BuildError {
    // ========================================================================
    // Discovery Errors
    // ========================================================================
    /// The shader source tree could not be enumerated.
    #[error("Failed to enumerate shader sources: {0}")]
    Discovery(#[from] walkdir::Error),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The configuration file is not valid TOML or has unknown keys.
    #[error("Config parse error in {}: {source}", .path.display())]
    ConfigParse {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A configuration value is out of range.
    #[error("Invalid config value: {0}")]
    InvalidConfig(String),
}

/// Why a single compile task failed.
///
/// Every variant is local to one shader and is converted into a failed
/// outcome by the task itself.
#[derive(Error, Debug)]
pub enum CompileFailure {
    /// The compiler process could not be started (missing or not executable).
    #[error("failed to launch `{tool}`: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler started but waiting on it failed. The process was killed.
    #[error("failed to wait on compiler: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler exited unsuccessfully. `None` means killed by a signal.
    #[error("compiler exited with {}", describe_code(.code))]
    ExitStatus { code: Option<i32> },

    /// The compiler reported success but the declared artifact is absent.
    #[error("compiler succeeded but output missing: {}", .0.display())]
    MissingOutput(PathBuf),

    /// The compiler ran past the configured deadline and was killed.
    #[error("compiler timed out after {0:?}")]
    TimedOut(Duration),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Alias for `Result<T, BuildError>`.
pub type Result<T> = std::result::Result<T, BuildError>;
