//! Python runtime discovery and tool installation
//!
//! This module provides:
//! - Runtime candidates and version probing
//! - Prioritized resolution (configured path, active environment, PATH probe)
//! - Installing the formatter into a resolved runtime

pub mod install;
pub mod probe;
pub mod resolver;

use std::fmt;

pub use install::Installer;
pub use probe::{probe_candidates, probe_runtime, Prober, RuntimeInfo, SystemProber};
pub use resolver::RuntimeResolver;

/// Sentinel that explicitly marks the configured path as unset
pub const UNSET_SENTINEL: &str = "unset";

/// A path or bare command believed to be a Python interpreter
///
/// Nothing about a candidate is validated up front; it only proves itself by
/// running successfully.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeCandidate(String);

impl RuntimeCandidate {
    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for names like `python3` that are left to PATH lookup
    pub fn is_bare_command(&self) -> bool {
        !self.0.contains('/') && !self.0.contains('\\')
    }
}

impl fmt::Display for RuntimeCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::ffi::OsStr> for RuntimeCandidate {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}
