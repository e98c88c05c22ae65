//! Build log and result sink.
//!
//! The host hands the orchestrator a [`BuildListener`]: an append-only text
//! log plus a single outcome field it reads after the build step returns.

use std::sync::Mutex;

use strum::Display;

/// Outcome of one build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum BuildResult {
    Success,
    Failure,
}

/// Append-only log sink with a settable build outcome.
///
/// Implementations must be `Send + Sync`: child output is forwarded from
/// reader threads while the pipeline waits on the process.
pub trait BuildListener: Send + Sync {
    /// Appends one progress or output line to the build log.
    fn log(&self, line: &str);

    /// Appends one diagnostic line to the build log.
    fn error(&self, line: &str) {
        self.log(&format!("ERROR: {}", line));
    }

    /// Records the build outcome.
    fn set_result(&self, result: BuildResult);

    /// Returns the recorded build outcome, if any.
    fn result(&self) -> Option<BuildResult>;
}

/// Listener that forwards the build log to `tracing`.
///
/// Used by the command-line front end, where the terminal is the build log.
#[derive(Debug, Default)]
pub struct TracingListener {
    result: Mutex<Option<BuildResult>>,
}

impl TracingListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BuildListener for TracingListener {
    fn log(&self, line: &str) {
        tracing::info!("{}", line);
    }

    fn error(&self, line: &str) {
        tracing::error!("{}", line);
    }

    fn set_result(&self, result: BuildResult) {
        if let Ok(mut slot) = self.result.lock() {
            *slot = Some(result);
        }
    }

    fn result(&self) -> Option<BuildResult> {
        self.result.lock().ok().and_then(|slot| *slot)
    }
}

/// Listener that keeps the whole build log in memory.
///
/// Suited for embedding hosts that persist the log themselves, and for tests.
#[derive(Debug, Default)]
pub struct MemoryListener {
    lines: Mutex<Vec<String>>,
    result: Mutex<Option<BuildResult>>,
}

impl MemoryListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the log lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// Returns true if any log line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl BuildListener for MemoryListener {
    fn log(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }

    fn set_result(&self, result: BuildResult) {
        if let Ok(mut slot) = self.result.lock() {
            *slot = Some(result);
        }
    }

    fn result(&self) -> Option<BuildResult> {
        self.result.lock().ok().and_then(|slot| *slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_result_display() {
        assert_eq!(BuildResult::Success.to_string(), "SUCCESS");
        assert_eq!(BuildResult::Failure.to_string(), "FAILURE");
    }

    #[test]
    fn memory_listener_records_lines_and_result() {
        let listener = MemoryListener::new();
        assert_eq!(listener.result(), None);

        listener.log("[pbuilder] $ true");
        listener.error("Command failed");
        listener.set_result(BuildResult::Failure);

        assert_eq!(listener.lines(), vec!["[pbuilder] $ true", "ERROR: Command failed"]);
        assert!(listener.contains("Command failed"));
        assert_eq!(listener.result(), Some(BuildResult::Failure));
    }

    #[test]
    fn tracing_listener_records_result() {
        let listener = TracingListener::new();
        listener.set_result(BuildResult::Success);
        assert_eq!(listener.result(), Some(BuildResult::Success));
    }
}
