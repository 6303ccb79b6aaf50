//! Active virtual environment as the cooperating runtime source

use super::{ChangeCallback, ContextHint, PluginRuntimeSource, Subscription};
use crate::platform::Platform;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Environment variables naming an activated environment, in priority order
const ENV_VARS: &[&str] = &["VIRTUAL_ENV", "CONDA_PREFIX"];

/// Reports the interpreter of the environment activated in the calling shell
#[derive(Debug, Clone)]
pub struct VirtualEnvSource {
    prefix: Option<PathBuf>,
    platform: Platform,
}

impl VirtualEnvSource {
    pub fn new(prefix: Option<PathBuf>, platform: Platform) -> Self {
        Self { prefix, platform }
    }

    /// Read `VIRTUAL_ENV`, then `CONDA_PREFIX`
    pub fn from_env() -> Self {
        let prefix = ENV_VARS
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .find(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::new(prefix, Platform::current())
    }

    fn interpreter_paths(&self, prefix: &Path) -> Vec<PathBuf> {
        match self.platform {
            // venv puts it under Scripts, conda at the root
            Platform::Windows => vec![
                prefix.join("Scripts").join("python.exe"),
                prefix.join("python.exe"),
            ],
            Platform::Unix => vec![prefix.join("bin").join("python")],
        }
    }
}

#[async_trait]
impl PluginRuntimeSource for VirtualEnvSource {
    fn is_active(&self) -> bool {
        true
    }

    async fn activate(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn execution_command(&self, _hint: &ContextHint) -> Vec<String> {
        let Some(prefix) = &self.prefix else {
            return Vec::new();
        };

        match self
            .interpreter_paths(prefix)
            .into_iter()
            .find(|path| path.is_file())
        {
            Some(path) => vec![path.to_string_lossy().into_owned()],
            None => {
                log::debug!("No interpreter found in environment {}", prefix.display());
                Vec::new()
            }
        }
    }

    fn on_execution_details_changed(&self, _callback: ChangeCallback) -> Subscription {
        // The environment of a running process never changes
        Subscription::noop()
    }
}
