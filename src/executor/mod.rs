//! Command execution abstraction for rspbuilder.
//!
//! This module provides:
//! - [`CommandSpec`]: Specification for commands to execute
//! - [`ExecutionResult`]: Result of command execution
//! - [`CommandExecutor`]: Trait for command execution strategies
//! - [`RealCommandExecutor`]: Production implementation using `std::process::Command`

mod pipe;
mod real;

use std::process::ExitStatus;

use anyhow::Result;
use camino::Utf8PathBuf;

use crate::env::Environment;
use crate::listener::BuildListener;
use crate::privilege::PrivilegeMethod;

pub use real::RealCommandExecutor;

/// Quotes a single argument for display if it contains whitespace or quotes.
fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Formats an argv into a single, quoted command line for the build log
/// (e.g., `sudo pbuilder --create --mirror "http://deb.example.org/my mirror"`).
pub fn format_command_line(argv: &[String]) -> String {
    argv.iter().map(|a| quote_arg(a)).collect::<Vec<_>>().join(" ")
}

/// Specification for a command to be executed
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The command to execute (e.g., "pbuilder")
    pub command: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory (optional, defaults to current directory)
    pub cwd: Option<Utf8PathBuf>,
    /// Complete environment of the child process; nothing else is inherited
    pub env: Environment,
    /// Privilege escalation method to wrap the command
    pub privilege: Option<PrivilegeMethod>,
}

impl CommandSpec {
    /// Creates a new CommandSpec with command and args
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            cwd: None,
            env: Environment::new(),
            privilege: None,
        }
    }

    /// Sets the privilege escalation method
    #[must_use]
    pub fn with_privilege(mut self, privilege: Option<PrivilegeMethod>) -> Self {
        self.privilege = privilege;
        self
    }

    /// Sets the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<Utf8PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Replaces the child environment
    #[must_use]
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Returns the full argument vector, including the privilege wrapper.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if let Some(method) = self.privilege {
            argv.push(method.command_name().to_string());
        }
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Returns the quoted command line as echoed to the build log.
    pub fn command_line(&self) -> String {
        format_command_line(&self.argv())
    }
}

/// Result of command execution
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the command (None in dry-run mode)
    pub status: Option<ExitStatus>,
}

impl ExecutionResult {
    /// Returns true if the command executed successfully.
    ///
    /// In dry-run mode (status is None), this always returns true.
    pub fn success(&self) -> bool {
        self.status.is_none_or(|s| s.success())
    }

    /// Returns the exit code if available
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Trait for command execution.
///
/// The child's stdout and stderr are forwarded line by line to `sink` while
/// the call blocks. An `Err` means the command could not be launched or
/// communicated with; a non-zero exit is reported through [`ExecutionResult`].
pub trait CommandExecutor: Send + Sync {
    /// Executes a command with the given specification.
    fn execute(&self, spec: &CommandSpec, sink: &dyn BuildListener) -> Result<ExecutionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_prepends_privilege_wrapper() {
        let spec = CommandSpec::new("pbuilder", vec!["--create".to_string()])
            .with_privilege(Some(PrivilegeMethod::Sudo));
        assert_eq!(spec.argv(), vec!["sudo", "pbuilder", "--create"]);
    }

    #[test]
    fn argv_without_privilege() {
        let spec = CommandSpec::new("dpkg-source", vec!["-b".to_string()]);
        assert_eq!(spec.argv(), vec!["dpkg-source", "-b"]);
    }

    #[test]
    fn command_line_quotes_whitespace() {
        let spec = CommandSpec::new(
            "dpkg-source",
            vec!["-b".to_string(), "/var/lib/ci/my project".to_string()],
        );
        assert_eq!(spec.command_line(), "dpkg-source -b \"/var/lib/ci/my project\"");
    }

    #[test]
    fn command_line_quotes_empty_and_escapes_quotes() {
        assert_eq!(
            format_command_line(&["echo".to_string(), String::new(), "a\"b".to_string()]),
            "echo \"\" \"a\\\"b\""
        );
    }

    #[test]
    fn dry_run_result_is_success() {
        let result = ExecutionResult { status: None };
        assert!(result.success());
        assert_eq!(result.code(), None);
    }
}
