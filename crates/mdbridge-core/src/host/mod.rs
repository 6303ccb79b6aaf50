//! Interfaces to the host that embeds the pipeline
//!
//! The pipeline only talks to its host through these narrow seams:
//! - [`PluginRuntimeSource`] - a cooperating source of the active interpreter
//! - [`NotificationSink`] - user-facing messages
//! - [`DocumentSurface`] - the text being formatted
//!
//! Terminal implementations live in the submodules.

pub mod console;
pub mod venv;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use console::ConsoleSink;
pub use venv::VirtualEnvSource;

/// What the request is about, used to pick an environment and a working directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextHint {
    /// Document being formatted, if it lives on disk
    pub path: Option<PathBuf>,
}

impl ContextHint {
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Directory the formatter runs in: the document's parent, when it exists
    pub fn working_dir(&self) -> Option<PathBuf> {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| dir.is_dir())
            .map(Path::to_path_buf)
    }
}

/// Callback fired when the cooperating source switches interpreters
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Registration guard; the release action runs exactly once, on drop
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Subscription with nothing to release
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Another component that knows which interpreter the user selected
#[async_trait]
pub trait PluginRuntimeSource: Send + Sync {
    fn is_active(&self) -> bool;

    /// Bring the source up; resolution skips it when this fails
    async fn activate(&self) -> anyhow::Result<()>;

    /// Command used to run Python for this context, empty when unknown
    fn execution_command(&self, hint: &ContextHint) -> Vec<String>;

    /// Register for interpreter changes until the returned guard is dropped
    fn on_execution_details_changed(&self, callback: ChangeCallback) -> Subscription;
}

/// User-facing message surface (fire-and-forget)
pub trait NotificationSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str, detail: Option<&str>);
}

/// A full-document replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub new_text: String,
}

impl TextEdit {
    pub fn replace_all(new_text: impl Into<String>) -> Self {
        Self {
            new_text: new_text.into(),
        }
    }
}

/// Text being formatted
pub trait DocumentSurface {
    fn text(&self) -> String;

    /// Replace the whole content
    fn apply(&mut self, edit: TextEdit);
}

/// In-memory document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringDocument {
    text: String,
}

impl StringDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl DocumentSurface for StringDocument {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn apply(&mut self, edit: TextEdit) {
        self.text = edit.new_text;
    }
}
