//! Internal utilities for streaming command output to the build log.
//!
//! This module handles reading from stdout/stderr pipes and forwarding
//! each line to the [`BuildListener`] as the child produces it.

use std::io::{BufRead, BufReader, Read};

use crate::listener::BuildListener;

/// Type of output stream for logging purposes.
#[derive(Clone, Copy)]
pub(super) enum StreamType {
    Stdout,
    Stderr,
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Extracts a human-readable message from a thread panic.
pub(super) fn panic_message(err: &(dyn std::any::Any + Send)) -> &str {
    err.downcast_ref::<&str>()
        .copied()
        .or_else(|| err.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}

/// Reads from a pipe and forwards each line to the build log in real time.
///
/// - Both streams go to the build log; they are also traced at DEBUG level
/// - Binary data uses lossy UTF-8 conversion
/// - I/O errors stop reading but don't fail command execution
///   (command success is determined by exit status)
/// - `None` pipe logs an error and returns (unexpected if `Stdio::piped()` was set)
pub(super) fn read_pipe_to_sink<R: Read>(
    pipe: Option<R>,
    stream_type: StreamType,
    sink: &dyn BuildListener,
) {
    let Some(pipe) = pipe else {
        tracing::error!(
            stream = %stream_type,
            "pipe was None (unexpected: Stdio::piped() was set), no output will be captured"
        );
        return;
    };

    let mut reader = BufReader::new(pipe);
    let mut line_buf = Vec::new();

    loop {
        line_buf.clear();
        match reader.read_until(b'\n', &mut line_buf) {
            Ok(0) => break, // EOF
            Ok(_) => {
                let content = line_buf.strip_suffix(b"\n").unwrap_or(&line_buf);
                forward_line(content, stream_type, sink);
            }
            Err(e) => {
                tracing::error!(stream = %stream_type, error = %e, "I/O error, stopping read");
                break;
            }
        }
    }
}

/// Forwards a complete line, trimming a trailing CR from CRLF endings.
fn forward_line(line: &[u8], stream_type: StreamType, sink: &dyn BuildListener) {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim_end_matches('\r');
    tracing::debug!(stream = %stream_type, "{}", trimmed);
    sink.log(trimmed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::MemoryListener;

    #[test]
    fn forwards_each_line() {
        let sink = MemoryListener::new();
        let input: &[u8] = b"dpkg-source: info: using source format '3.0 (quilt)'\r\nsecond\nlast";
        read_pipe_to_sink(Some(input), StreamType::Stdout, &sink);
        assert_eq!(
            sink.lines(),
            vec![
                "dpkg-source: info: using source format '3.0 (quilt)'",
                "second",
                "last"
            ]
        );
    }

    #[test]
    fn none_pipe_is_ignored() {
        let sink = MemoryListener::new();
        read_pipe_to_sink::<&[u8]>(None, StreamType::Stderr, &sink);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn panic_message_extracts_str_and_string() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*boxed), "static");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*boxed), "owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
