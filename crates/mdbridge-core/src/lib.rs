//! mdbridge Core - run mdformat from Rust through a discovered Python
//!
//! This library locates a Python interpreter, verifies that the formatter is
//! installed under it, and drives one-shot text-in/text-out formatter runs.
//!
//! # Architecture
//!
//! The pipeline is organized leaves first:
//!
//! - **Runtime resolution** ([`runtime`]) - configured path, cooperating
//!   source, then a `--version` probe of well-known interpreter names
//! - **Availability cache** ([`cache`]) - remembers a positive verdict per
//!   runtime so formatting does not pay for a version check every time
//! - **Invocation** ([`invoke`]) - argument assembly, the platform launch plan,
//!   stdin/stdout piping and exit classification
//! - **Orchestration** ([`orchestrator`]) - composes the above and reports
//!   failures through the host's [`host::NotificationSink`]
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based installation check
//!
//! # Example Usage
//!
//! ```ignore
//! use mdbridge_core::{ConsoleSink, ContextHint, FormatOptions, FormatOrchestrator, YamlConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let orchestrator = FormatOrchestrator::new(Arc::new(YamlConfig::load(None)?), Arc::new(ConsoleSink));
//! let edit = orchestrator
//!     .format("# Title\n\n\n", &ContextHint::default(), &FormatOptions::default(), &CancellationToken::new())
//!     .await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod invoke;
pub mod orchestrator;
pub mod platform;
pub mod runtime;
pub mod tool;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use cache::{AvailabilityCache, Verdict};
pub use config::{ConfigSource, EndOfLine, FormatOptions, WrapMode, YamlConfig};
pub use error::FormatError;
pub use host::{
    ConsoleSink, ContextHint, DocumentSurface, NotificationSink, PluginRuntimeSource,
    StringDocument, Subscription, TextEdit, VirtualEnvSource,
};
pub use invoke::{InvocationOutcome, InvocationRequest, Invoke, ToolInvoker};
pub use orchestrator::FormatOrchestrator;
pub use platform::Platform;
pub use runtime::{RuntimeCandidate, RuntimeResolver};
pub use tool::ToolConfig;

#[cfg(feature = "tui")]
pub use tui::run_check;
