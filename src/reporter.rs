//! Converts the outcome of a pipeline run into a build result.
//!
//! This is the single place where faults end: a failed run is written to the
//! build log as a diagnostic and recorded as [`BuildResult::Failure`], and
//! nothing is propagated to the host.

use std::error::Error as _;

use tracing::debug;

use crate::error::RspbuilderError;
use crate::listener::{BuildListener, BuildResult};
use crate::pipeline::LOG_PREFIX;

/// Records the outcome of a run on `listener` and returns it.
pub fn report(
    outcome: Result<(), RspbuilderError>,
    listener: &dyn BuildListener,
) -> BuildResult {
    let result = match outcome {
        Ok(()) => BuildResult::Success,
        Err(err) => {
            let category = err.category();
            debug!(category = %category, exit_code = ?err.exit_code(), "build failed: {:?}", err);

            listener.error(&category.to_string());
            listener.log(&format!("{} {}", LOG_PREFIX, err));
            if let Some(code) = err.exit_code() {
                listener.log(&format!("{} exit code: {}", LOG_PREFIX, code));
            }
            let mut source = err.source();
            while let Some(cause) = source {
                listener.log(&format!("{} caused by: {}", LOG_PREFIX, cause));
                source = cause.source();
            }
            BuildResult::Failure
        }
    };
    listener.set_result(result);
    result
}
