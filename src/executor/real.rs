//! Real command executor implementation.
//!
//! This module provides [`RealCommandExecutor`], which executes commands
//! using `std::process::Command` and streams their output to the build log
//! while waiting for them.

use std::process::{Child, Command, Stdio};
use std::thread::{self, ScopedJoinHandle};

use anyhow::Result;
use camino::Utf8Path;
use which::{which, which_in};

use super::pipe::{StreamType, panic_message, read_pipe_to_sink};
use super::{CommandExecutor, CommandSpec, ExecutionResult};
use crate::error::RspbuilderError;
use crate::listener::BuildListener;

/// Kills a child process and joins its reader threads.
///
/// Called from error paths in [`RealCommandExecutor::execute()`] so that no
/// child or reader thread outlives a failed execution.
fn cleanup_child_process<'scope, I>(child: &mut Child, handles: I)
where
    I: IntoIterator<Item = ScopedJoinHandle<'scope, ()>>,
{
    let pid = child.id();
    if let Err(e) = child.kill() {
        tracing::debug!(pid = pid, "kill returned error (process may have already exited): {}", e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!(pid = pid, "failed to wait for child process after kill: {}", e);
    }
    for handle in handles {
        if let Err(e) = handle.join() {
            tracing::warn!("reader thread panicked during cleanup: {}", panic_message(&*e));
        }
    }
}

fn execution_error(command: &str, status: impl Into<String>) -> anyhow::Error {
    RspbuilderError::Execution {
        command: command.to_string(),
        status: status.into(),
    }
    .into()
}

/// Command executor that runs actual system commands.
///
/// When `dry_run` is true, commands are logged but not executed,
/// and `execute()` returns `Ok(ExecutionResult { status: None })`.
pub struct RealCommandExecutor {
    pub dry_run: bool,
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, spec: &CommandSpec, sink: &dyn BuildListener) -> Result<ExecutionResult> {
        let command_line = spec.command_line();
        if self.dry_run {
            tracing::info!("dry run: {}", command_line);
            return Ok(ExecutionResult { status: None });
        }

        let argv = spec.argv();
        let Some((program, args)) = argv.split_first() else {
            return Err(execution_error(&command_line, "empty command line"));
        };

        // Resolve against the child's PATH when one is given.
        let resolved = match spec.env.get("PATH") {
            Some(path) => {
                let cwd = spec.cwd.as_deref().unwrap_or(Utf8Path::new("."));
                which_in(program, Some(path), cwd)
            }
            None => which(program),
        };
        let cmd = resolved.map_err(|e| {
            execution_error(program, format!("command not found in PATH: {}", e))
        })?;
        tracing::trace!("command found: {}: {}", program, cmd.to_string_lossy());

        let mut command = Command::new(cmd);
        command.args(args);

        if let Some(ref cwd) = spec.cwd {
            command.current_dir(cwd);
        }

        command.env_clear();
        command.envs(&spec.env);

        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| execution_error(&command_line, format!("failed to spawn: {}", e)))?;

        tracing::trace!("spawned command: {}: pid={}", program, child.id());

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let status = thread::scope(|scope| {
            let stdout_handle = match thread::Builder::new()
                .name("stdout-reader".to_string())
                .spawn_scoped(scope, move || {
                    read_pipe_to_sink(stdout_pipe, StreamType::Stdout, sink)
                })
            {
                Ok(handle) => handle,
                Err(e) => {
                    cleanup_child_process(&mut child, []);
                    return Err(execution_error(
                        &command_line,
                        format!("failed to spawn stdout reader thread: {}", e),
                    ));
                }
            };

            let stderr_handle = match thread::Builder::new()
                .name("stderr-reader".to_string())
                .spawn_scoped(scope, move || {
                    read_pipe_to_sink(stderr_pipe, StreamType::Stderr, sink)
                })
            {
                Ok(handle) => handle,
                Err(e) => {
                    cleanup_child_process(&mut child, [stdout_handle]);
                    return Err(execution_error(
                        &command_line,
                        format!("failed to spawn stderr reader thread: {}", e),
                    ));
                }
            };

            let status = match child.wait() {
                Ok(s) => s,
                Err(e) => {
                    cleanup_child_process(&mut child, [stdout_handle, stderr_handle]);
                    return Err(execution_error(
                        &command_line,
                        format!("failed to wait for command: {}", e),
                    ));
                }
            };

            let mut panicked_streams = Vec::new();
            let handles = [("stdout", stdout_handle), ("stderr", stderr_handle)];
            for (name, handle) in handles {
                if let Err(e) = handle.join() {
                    let msg = panic_message(&*e);
                    tracing::error!(stream = name, panic = msg, "reader thread panicked");
                    panicked_streams.push(format!("{}: {}", name, msg));
                }
            }

            if !panicked_streams.is_empty() {
                return Err(execution_error(
                    &command_line,
                    format!(
                        "reader thread(s) panicked during command execution: {}",
                        panicked_streams.join(", ")
                    ),
                ));
            }

            Ok(status)
        })?;

        tracing::trace!("executed command: {}: success={}", program, status.success());

        Ok(ExecutionResult {
            status: Some(status),
        })
    }
}
