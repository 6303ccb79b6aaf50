//! Error taxonomy for the format pipeline

use crate::runtime::RuntimeCandidate;
use thiserror::Error;

/// Classified failure of a format or check request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// None of the runtime sources produced a usable interpreter
    #[error(
        "No Python interpreter found. Set `python_path` in .mdbridge.yaml, \
         export MDBRIDGE_PYTHON, or make python3 available on PATH."
    )]
    NoRuntimeFound,

    /// The tool did not answer its version probe under this runtime
    #[error(
        "{tool} is not available for the Python interpreter at '{runtime}'. \
         Install it with: {runtime} -m pip install {package}"
    )]
    ToolUnavailable {
        runtime: RuntimeCandidate,
        tool: &'static str,
        package: &'static str,
    },

    /// The subprocess could not be started at all
    #[error("Failed to start '{runtime}': {reason}")]
    ProcessStartFailure {
        runtime: RuntimeCandidate,
        reason: String,
    },

    /// The tool ran and reported a failure, usually about the content itself
    #[error("{stderr}")]
    ToolExitedWithError { exit_code: i32, stderr: String },

    /// The tool was killed by a signal before it could exit
    #[error("Formatter terminated by signal {signal}")]
    TerminatedBySignal { signal: String },

    /// The caller cancelled the request
    #[error("Formatting cancelled")]
    Cancelled,
}

impl FormatError {
    /// Whether this error should reach the user at all
    pub fn is_silent(&self) -> bool {
        matches!(self, FormatError::Cancelled)
    }
}
