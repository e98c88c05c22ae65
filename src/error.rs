//! Domain-specific error types for rspbuilder.
//!
//! This module defines `RspbuilderError`, a `thiserror`-based enum that
//! provides typed error variants for every way a build run can stop.
//! Pipeline functions return `Result<T, RspbuilderError>`, while trait
//! boundaries (command execution, CLI entry points) use `anyhow::Result`.
//!
//! A build run only ever stops on one of two fault categories, see
//! [`FaultCategory`]: an external command exiting non-zero, or an I/O fault
//! while staging directories, listing files or launching a command.

use std::io;

use strum::Display;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent, user-friendly messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)"). For unrecognized
/// error kinds, falls back to including the OS-level error message.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        io::ErrorKind::NotADirectory => "I/O error: not a directory".to_string(),
        io::ErrorKind::DirectoryNotEmpty => "I/O error: directory not empty".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Category of a fault, as shown in the build log diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FaultCategory {
    /// An external command ran and exited with a non-zero status.
    #[strum(serialize = "Command failed")]
    ExternalCommand,
    /// A filesystem or process-communication fault.
    #[strum(serialize = "I/O Exception")]
    Io,
    /// The configuration was rejected before any command ran.
    #[strum(serialize = "Configuration error")]
    Configuration,
}

/// Domain-specific error type for rspbuilder.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RspbuilderError {
    /// A validation constraint was violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A profile could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An external command exited with a non-zero status.
    #[error("command failed with rc={}: {command}", exit_code_label(.code))]
    CommandFailed {
        /// The command line that was executed.
        command: String,
        /// The exit code, `None` when the process was terminated by a signal.
        code: Option<i32>,
    },

    /// A command could not be launched or communicated with
    /// (not found in PATH, spawn failure, wait failure, reader thread panic).
    #[error("command execution failed: {command}: {status}")]
    Execution {
        /// The command that was executed.
        command: String,
        /// Human-readable reason for the failure.
        status: String,
    },

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred, usually including a path.
        context: String,
        /// Description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error, preserved for programmatic inspection.
        #[source]
        source: std::io::Error,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl RspbuilderError {
    /// Creates an `Io` variant with the `message` field derived from `source`.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }

    /// Returns the fault category used when reporting this error.
    pub fn category(&self) -> FaultCategory {
        match self {
            Self::CommandFailed { .. } => FaultCategory::ExternalCommand,
            Self::Execution { .. } | Self::Io { .. } => FaultCategory::Io,
            Self::Validation(_) | Self::Config(_) => FaultCategory::Configuration,
        }
    }

    /// Returns the exit code of the failed command, if this is a command failure
    /// with a regular exit status.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}
