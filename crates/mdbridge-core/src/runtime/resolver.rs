//! Prioritized runtime resolution
//!
//! Sources are tried strictly in order and the first hit wins:
//! 1. The configured `python_path`, when it exists on disk
//! 2. The cooperating runtime source (e.g. the active virtual environment)
//! 3. Well-known bare interpreter names, probed with `--version`

use super::probe::{probe_candidates, probe_runtime, Prober, SystemProber};
use super::{RuntimeCandidate, UNSET_SENTINEL};
use crate::config::{ConfigSource, KEY_PYTHON_PATH};
use crate::host::{ContextHint, PluginRuntimeSource};
use crate::platform::Platform;
use crate::tool::ToolConfig;
use std::sync::Arc;

/// Finds an interpreter to run the formatter with
pub struct RuntimeResolver {
    config: Arc<dyn ConfigSource>,
    plugin: Option<Arc<dyn PluginRuntimeSource>>,
    prober: Arc<dyn Prober>,
    platform: Platform,
    runtime_name: &'static str,
}

impl RuntimeResolver {
    /// Resolver over the given settings that probes real processes
    pub fn new(config: Arc<dyn ConfigSource>, tool: &ToolConfig) -> Self {
        Self {
            config,
            plugin: None,
            prober: Arc::new(SystemProber),
            platform: Platform::current(),
            runtime_name: tool.runtime_name,
        }
    }

    /// Consult a cooperating runtime source after the configured path
    pub fn with_plugin(mut self, plugin: Arc<dyn PluginRuntimeSource>) -> Self {
        self.plugin = Some(plugin);
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn plugin(&self) -> Option<&Arc<dyn PluginRuntimeSource>> {
        self.plugin.as_ref()
    }

    pub fn prober(&self) -> &dyn Prober {
        self.prober.as_ref()
    }

    pub fn runtime_name(&self) -> &'static str {
        self.runtime_name
    }

    /// Resolve a runtime, or `None` when every source comes up empty
    pub async fn resolve(&self, hint: &ContextHint) -> Option<RuntimeCandidate> {
        if let Some(candidate) = self.from_config().await {
            log::debug!("Using configured runtime {}", candidate);
            return Some(candidate);
        }

        if let Some(candidate) = self.from_plugin(hint).await {
            log::debug!("Using runtime from active environment {}", candidate);
            return Some(candidate);
        }

        if let Some(candidate) = self.from_probe().await {
            log::debug!("Using runtime found on PATH {}", candidate);
            return Some(candidate);
        }

        log::debug!("No {} runtime found", self.runtime_name);
        None
    }

    async fn from_config(&self) -> Option<RuntimeCandidate> {
        let configured = self.config.get_string(KEY_PYTHON_PATH, "");
        let configured = configured.trim();

        if configured.is_empty() || configured.eq_ignore_ascii_case(UNSET_SENTINEL) {
            return None;
        }

        match tokio::fs::try_exists(configured).await {
            Ok(true) => Some(RuntimeCandidate::new(configured)),
            Ok(false) => {
                log::warn!(
                    "Configured {} '{}' does not exist; trying other sources",
                    KEY_PYTHON_PATH,
                    configured
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "Cannot access configured {} '{}': {}; trying other sources",
                    KEY_PYTHON_PATH,
                    configured,
                    e
                );
                None
            }
        }
    }

    async fn from_plugin(&self, hint: &ContextHint) -> Option<RuntimeCandidate> {
        let plugin = self.plugin.as_ref()?;

        if !plugin.is_active() {
            if let Err(e) = plugin.activate().await {
                log::warn!("Failed to activate runtime source: {:#}", e);
                return None;
            }
        }

        let command = plugin.execution_command(hint);
        if command.len() > 1 {
            log::debug!(
                "Runtime source reported {:?}; using the interpreter only",
                command
            );
        }

        command
            .into_iter()
            .next()
            .filter(|program| !program.trim().is_empty())
            .map(RuntimeCandidate::new)
    }

    async fn from_probe(&self) -> Option<RuntimeCandidate> {
        for name in probe_candidates(self.platform) {
            if let Some(info) = probe_runtime(self.prober.as_ref(), name, self.runtime_name).await {
                return Some(info.candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YamlConfig;
    use crate::host::{ChangeCallback, Subscription};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProber {
        outputs: HashMap<&'static str, &'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProber {
        fn with(outputs: &[(&'static str, &'static str)]) -> Self {
            Self {
                outputs: outputs.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn version_output(&self, command: &str) -> Option<String> {
            self.calls.lock().unwrap().push(command.to_string());
            self.outputs.get(command).map(|s| s.to_string())
        }
    }

    struct FakePlugin {
        active: AtomicBool,
        fail_activation: bool,
        command: Vec<String>,
        activations: AtomicUsize,
    }

    impl FakePlugin {
        fn new(active: bool, command: &[&str]) -> Self {
            Self {
                active: AtomicBool::new(active),
                fail_activation: false,
                command: command.iter().map(|s| s.to_string()).collect(),
                activations: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PluginRuntimeSource for FakePlugin {
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        async fn activate(&self) -> anyhow::Result<()> {
            self.activations.fetch_add(1, Ordering::SeqCst);
            if self.fail_activation {
                anyhow::bail!("extension failed to load");
            }
            self.active.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn execution_command(&self, _hint: &ContextHint) -> Vec<String> {
            self.command.clone()
        }

        fn on_execution_details_changed(&self, _callback: ChangeCallback) -> Subscription {
            Subscription::noop()
        }
    }

    fn config_with_path(path: &str) -> Arc<dyn ConfigSource> {
        let mut config = YamlConfig::new();
        config.set(KEY_PYTHON_PATH, path);
        Arc::new(config)
    }

    fn resolver(config: Arc<dyn ConfigSource>, prober: Arc<FakeProber>) -> RuntimeResolver {
        RuntimeResolver::new(config, &ToolConfig::default())
            .with_prober(prober)
            .with_platform(Platform::Unix)
    }

    #[tokio::test]
    async fn test_existing_configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let python = dir.path().join("python");
        std::fs::write(&python, "").unwrap();
        let prober = Arc::new(FakeProber::with(&[("python3", "Python 3.12.0")]));

        let resolved = resolver(config_with_path(python.to_str().unwrap()), prober.clone())
            .with_plugin(Arc::new(FakePlugin::new(true, &["/venv/bin/python"])))
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new(python.to_str().unwrap())));
        assert!(prober.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_configured_path_falls_through() {
        let prober = Arc::new(FakeProber::with(&[("python3", "Python 3.12.0")]));

        let resolved = resolver(config_with_path("/no/such/python"), prober)
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("python3")));
    }

    #[tokio::test]
    async fn test_missing_configured_path_uses_plugin() {
        let prober = Arc::new(FakeProber::default());

        let resolved = resolver(config_with_path("/no/such/python"), prober.clone())
            .with_plugin(Arc::new(FakePlugin::new(true, &["/venv/bin/python"])))
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("/venv/bin/python")));
        assert!(prober.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unset_sentinel_is_ignored() {
        let prober = Arc::new(FakeProber::with(&[("python", "Python 3.9.2")]));

        let resolved = resolver(config_with_path("UNSET"), prober.clone())
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("python")));
        assert_eq!(prober.calls(), vec!["python3", "python"]);
    }

    #[tokio::test]
    async fn test_inactive_plugin_is_activated() {
        let plugin = Arc::new(FakePlugin::new(false, &["/venv/bin/python"]));
        let prober = Arc::new(FakeProber::default());

        let resolved = resolver(Arc::new(YamlConfig::new()), prober)
            .with_plugin(plugin.clone())
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("/venv/bin/python")));
        assert_eq!(plugin.activations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_activation_falls_through() {
        let mut plugin = FakePlugin::new(false, &["/venv/bin/python"]);
        plugin.fail_activation = true;
        let prober = Arc::new(FakeProber::with(&[("python3", "Python 3.12.0")]));

        let resolved = resolver(Arc::new(YamlConfig::new()), prober)
            .with_plugin(Arc::new(plugin))
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("python3")));
    }

    #[tokio::test]
    async fn test_empty_plugin_command_falls_through() {
        let prober = Arc::new(FakeProber::with(&[("python3", "Python 3.12.0")]));

        let resolved = resolver(Arc::new(YamlConfig::new()), prober)
            .with_plugin(Arc::new(FakePlugin::new(true, &[])))
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("python3")));
    }

    #[tokio::test]
    async fn test_probe_skips_non_python_output() {
        let prober = Arc::new(FakeProber::with(&[
            ("python3", "command not found: pyenv shim"),
            ("python", "Python 3.10.12"),
        ]));

        let resolved = resolver(Arc::new(YamlConfig::new()), prober.clone())
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("python")));
        assert_eq!(prober.calls(), vec!["python3", "python"]);
    }

    #[tokio::test]
    async fn test_windows_probe_order() {
        let prober = Arc::new(FakeProber::with(&[("python3", "Python 3.12.0")]));

        let resolved = resolver(Arc::new(YamlConfig::new()), prober.clone())
            .with_platform(Platform::Windows)
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, Some(RuntimeCandidate::new("python3")));
        assert_eq!(prober.calls(), vec!["py", "python", "python3"]);
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let prober = Arc::new(FakeProber::default());

        let resolved = resolver(config_with_path("/no/such/python"), prober)
            .with_plugin(Arc::new(FakePlugin::new(true, &[])))
            .resolve(&ContextHint::default())
            .await;

        assert_eq!(resolved, None);
    }
}
