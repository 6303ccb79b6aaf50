//! One-shot formatter subprocess
//!
//! Each invocation spawns the runtime, writes the whole input to stdin,
//! closes it, collects stdout and stderr in full, and classifies the exit.

pub mod args;
pub mod plan;

use crate::platform::Platform;
use crate::runtime::RuntimeCandidate;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

pub use args::{format_args, STDIN_MARKER};
pub use plan::{plan_invocation, InvocationPlan};

/// Everything needed for a single invocation
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub runtime: RuntimeCandidate,
    pub args: Vec<String>,
    pub input: String,
    pub working_dir: Option<PathBuf>,
    pub cancel: CancellationToken,
}

impl InvocationRequest {
    pub fn new(runtime: RuntimeCandidate, args: Vec<String>, input: impl Into<String>) -> Self {
        Self {
            runtime,
            args,
            input: input.into(),
            working_dir: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Exit 0; stdout as text
    Success(String),
    /// Non-zero exit with the tool's diagnostics
    ToolReportedFailure { exit_code: i32, stderr: String },
    /// The process never started
    ProcessStartFailure(String),
    /// Killed by a signal
    TerminatedBySignal(String),
    /// Cancellation was requested before the process exited
    Cancelled,
}

/// Runs an invocation to completion
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn run(&self, request: InvocationRequest) -> InvocationOutcome;
}

/// Invoker that spawns real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolInvoker {
    platform: Platform,
}

impl ToolInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_platform(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Invoke for ToolInvoker {
    async fn run(&self, request: InvocationRequest) -> InvocationOutcome {
        let plan = plan_invocation(&request.runtime, &request.args, self.platform);
        log::debug!("Running {}", plan);

        let mut command = plan.command();
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::debug!("Failed to start {}: {}", plan, e);
                return InvocationOutcome::ProcessStartFailure(e.to_string());
            }
        };

        // Write from a separate task so a tool that fills its stdout pipe
        // before draining stdin cannot deadlock us
        let writer = child.stdin.take().map(|mut stdin| {
            let input = request.input.into_bytes();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    log::debug!("Failed to write formatter input: {}", e);
                }
                // Dropping stdin closes it; no further input is ever sent
            })
        });

        let output = child.wait_with_output().await;

        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                log::debug!("Input writer task failed: {}", e);
            }
        }

        match output {
            Ok(output) => classify(
                output.status,
                &output.stdout,
                &output.stderr,
                request.cancel.is_cancelled(),
            ),
            Err(e) => {
                log::warn!("Failed waiting for {}: {}", plan, e);
                InvocationOutcome::ProcessStartFailure(format!("failed to wait for process: {}", e))
            }
        }
    }
}

/// Classify an exited process; cancellation wins over any exit status
fn classify(status: ExitStatus, stdout: &[u8], stderr: &[u8], cancelled: bool) -> InvocationOutcome {
    if cancelled {
        log::debug!("Invocation cancelled, discarding output ({})", status);
        return InvocationOutcome::Cancelled;
    }

    match status.code() {
        Some(0) => InvocationOutcome::Success(String::from_utf8_lossy(stdout).into_owned()),
        Some(code) => failure(code, stderr),
        None => match termination_signal(&status) {
            Some(signal) => InvocationOutcome::TerminatedBySignal(signal),
            None => failure(-1, stderr),
        },
    }
}

fn failure(exit_code: i32, stderr: &[u8]) -> InvocationOutcome {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim_end();
    let stderr = if text.trim().is_empty() {
        format!("exited with code {}", exit_code)
    } else {
        text.to_string()
    };
    InvocationOutcome::ToolReportedFailure { exit_code, stderr }
}

#[cfg(unix)]
fn termination_signal(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(signal_name)
}

#[cfg(not(unix))]
fn termination_signal(_status: &ExitStatus) -> Option<String> {
    None
}

#[cfg(unix)]
fn signal_name(signal: i32) -> String {
    let name = match signal {
        1 => "SIGHUP",
        2 => "SIGINT",
        3 => "SIGQUIT",
        4 => "SIGILL",
        6 => "SIGABRT",
        8 => "SIGFPE",
        9 => "SIGKILL",
        11 => "SIGSEGV",
        13 => "SIGPIPE",
        14 => "SIGALRM",
        15 => "SIGTERM",
        other => return format!("signal {}", other),
    };
    name.to_string()
}
