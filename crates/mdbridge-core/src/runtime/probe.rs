//! Runtime probing with `--version`

use super::RuntimeCandidate;
use crate::platform::Platform;
use async_trait::async_trait;
use semver::Version;
use std::process::Stdio;
use tokio::process::Command;

/// Flag used to ask an interpreter for its version
pub const VERSION_FLAG: &str = "--version";

/// Bare interpreter names probed on Windows, in order of preference
const WINDOWS_CANDIDATES: &[&str] = &["py", "python", "python3"];

/// Bare interpreter names probed elsewhere, in order of preference
const UNIX_CANDIDATES: &[&str] = &["python3", "python"];

/// Bare interpreter names to probe on a platform
pub fn probe_candidates(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => WINDOWS_CANDIDATES,
        Platform::Unix => UNIX_CANDIDATES,
    }
}

/// Runs `<command> --version`
#[async_trait]
pub trait Prober: Send + Sync {
    /// Combined stdout and stderr when the command ran and exited 0
    async fn version_output(&self, command: &str) -> Option<String>;
}

/// Prober that spawns real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProber;

#[async_trait]
impl Prober for SystemProber {
    async fn version_output(&self, command: &str) -> Option<String> {
        let output = Command::new(command)
            .arg(VERSION_FLAG)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                // Python 2 prints its version on stderr
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&out.stderr));
                Some(text)
            }
            Ok(out) => {
                log::debug!("'{} {}' exited with {}", command, VERSION_FLAG, out.status);
                None
            }
            Err(e) => {
                log::debug!("Failed to run '{} {}': {}", command, VERSION_FLAG, e);
                None
            }
        }
    }
}

/// Probe result for a runtime that identified itself
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub candidate: RuntimeCandidate,
    pub version: Option<Version>,
}

/// Probe `command` and accept it if its version output names `expected`
pub async fn probe_runtime(
    prober: &dyn Prober,
    command: &str,
    expected: &str,
) -> Option<RuntimeInfo> {
    let output = prober.version_output(command).await?;

    if !output.to_lowercase().contains(&expected.to_lowercase()) {
        log::debug!(
            "'{}' does not look like {}: {}",
            command,
            expected,
            output.trim()
        );
        return None;
    }

    Some(RuntimeInfo {
        candidate: RuntimeCandidate::new(command),
        version: parse_version(&output),
    })
}

/// Parse the version out of output like `Python 3.12.1`
///
/// Two-part versions are padded (`3.13` -> `3.13.0`) and pre-release suffixes
/// such as `rc1` are dropped.
pub fn parse_version(output: &str) -> Option<Version> {
    let token = output
        .split_whitespace()
        .find(|t| t.trim_start_matches('v').starts_with(|c: char| c.is_ascii_digit()))?;
    let cleaned = token.trim_start_matches('v');

    let numeric: String = cleaned
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let numeric = numeric.trim_end_matches('.');

    let padded = match numeric.matches('.').count() {
        0 => format!("{}.0.0", numeric),
        1 => format!("{}.0", numeric),
        _ => numeric.to_string(),
    };

    Version::parse(&padded).ok()
}
