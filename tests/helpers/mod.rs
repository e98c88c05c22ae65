//! Shared test infrastructure: a recording command executor and a
//! workspace that can be told to fail.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Mutex;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use rspbuilder::RspbuilderError;
use rspbuilder::executor::{CommandExecutor, CommandSpec, ExecutionResult};
use rspbuilder::listener::BuildListener;
use rspbuilder::workspace::{GlobPattern, LocalWorkspace, Workspace};

/// Builds an exit status carrying `code`, as returned by `waitpid`.
#[allow(dead_code)]
pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Returns the temporary directory as a UTF-8 path.
#[allow(dead_code)]
pub fn utf8_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("tempdir path should be UTF-8")
}

/// How a recorded call should end.
#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub enum Failure {
    /// The command runs and exits with this code.
    Exit(i32),
    /// The command cannot be launched.
    Launch,
}

/// A command seen by [`RecordingExecutor`].
#[derive(Clone, Debug)]
#[allow(dead_code)]
pub struct RecordedCall {
    pub argv: Vec<String>,
    pub cwd: Option<Utf8PathBuf>,
    pub spec: CommandSpec,
}

type SideEffect = Box<dyn Fn(&CommandSpec) + Send + Sync>;

/// Records executed commands in order, optionally failing on one call.
#[allow(dead_code)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    failure: Option<(usize, Failure)>,
    side_effect: Option<SideEffect>,
}

#[allow(dead_code)]
impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: None,
            side_effect: None,
        }
    }

    /// The call at `index` (0-based) ends with `failure`.
    pub fn failing_on(index: usize, failure: Failure) -> Self {
        Self {
            failure: Some((index, failure)),
            ..Self::new()
        }
    }

    /// Runs `effect` for every successful call, e.g. to fake produced files.
    pub fn with_side_effect(
        mut self,
        effect: impl Fn(&CommandSpec) + Send + Sync + 'static,
    ) -> Self {
        self.side_effect = Some(Box::new(effect));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|call| {
                call.argv
                    .iter()
                    .find(|arg| !matches!(arg.as_str(), "sudo" | "doas"))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, spec: &CommandSpec, sink: &dyn BuildListener) -> Result<ExecutionResult> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(RecordedCall {
            argv: spec.argv(),
            cwd: spec.cwd.clone(),
            spec: spec.clone(),
        });
        drop(calls);

        sink.log(&format!("mock output of {}", spec.command));

        match self.failure {
            Some((at, Failure::Exit(code))) if at == index => Ok(ExecutionResult {
                status: Some(exit_status(code)),
            }),
            Some((at, Failure::Launch)) if at == index => Err(RspbuilderError::Execution {
                command: spec.command.clone(),
                status: "command not found in PATH".to_string(),
            }
            .into()),
            _ => {
                if let Some(effect) = &self.side_effect {
                    effect(spec);
                }
                Ok(ExecutionResult {
                    status: Some(exit_status(0)),
                })
            }
        }
    }
}

/// Side effect faking `dpkg-source -b`: drops the given files into its cwd.
#[allow(dead_code)]
pub fn fake_source_package(files: &'static [&'static str]) -> impl Fn(&CommandSpec) + Send + Sync {
    move |spec: &CommandSpec| {
        if spec.command == "dpkg-source" {
            let cwd = spec.cwd.as_ref().expect("dpkg-source should have a cwd");
            for file in files {
                std::fs::write(cwd.join(file), "").unwrap();
            }
        }
    }
}

/// Local workspace whose destructive operations can be made to fail.
#[allow(dead_code)]
pub struct FaultyWorkspace {
    inner: LocalWorkspace,
    fail_remove: bool,
    fail_create: bool,
}

#[allow(dead_code)]
impl FaultyWorkspace {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            inner: LocalWorkspace::new(root),
            fail_remove: false,
            fail_create: false,
        }
    }

    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }
}

#[allow(dead_code)]
fn permission_denied(context: String) -> RspbuilderError {
    RspbuilderError::Io {
        context,
        message: "I/O error: permission denied".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied"),
    }
}

impl Workspace for FaultyWorkspace {
    fn root(&self) -> &Utf8Path {
        self.inner.root()
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        self.inner.exists(path)
    }

    fn remove_recursive(&self, path: &Utf8Path) -> Result<(), RspbuilderError> {
        if self.fail_remove {
            return Err(permission_denied(format!("failed to remove {}", path)));
        }
        self.inner.remove_recursive(path)
    }

    fn create_dir_all(&self, path: &Utf8Path) -> Result<(), RspbuilderError> {
        if self.fail_create {
            return Err(permission_denied(format!("failed to create directory {}", path)));
        }
        self.inner.create_dir_all(path)
    }

    fn list(
        &self,
        dir: &Utf8Path,
        pattern: &GlobPattern,
    ) -> Result<Vec<Utf8PathBuf>, RspbuilderError> {
        self.inner.list(dir, pattern)
    }
}
