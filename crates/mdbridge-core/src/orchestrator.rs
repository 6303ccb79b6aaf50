//! Format requests: resolve a runtime, confirm the tool, run it
//!
//! Each request walks the same steps in order and stops at the first failure:
//!
//! ```text
//! resolve runtime -> check availability -> invoke -> map outcome
//! ```
//!
//! Failures are reported once through the [`NotificationSink`] and returned
//! to the caller; cancellation is returned but never reported.

use crate::cache::AvailabilityCache;
use crate::config::{ConfigSource, FormatOptions};
use crate::error::FormatError;
use crate::host::{ContextHint, DocumentSurface, NotificationSink, Subscription, TextEdit};
use crate::invoke::{format_args, InvocationOutcome, InvocationRequest, Invoke, ToolInvoker};
use crate::runtime::{RuntimeCandidate, RuntimeResolver};
use crate::tool::ToolConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Composes resolution, the availability cache, and invocation
pub struct FormatOrchestrator {
    tool: ToolConfig,
    config: Arc<dyn ConfigSource>,
    resolver: RuntimeResolver,
    cache: Arc<AvailabilityCache>,
    invoker: Arc<dyn Invoke>,
    notifier: Arc<dyn NotificationSink>,
    // Held for its Drop; releases the runtime-change registration
    _subscription: Option<Subscription>,
}

impl FormatOrchestrator {
    /// Orchestrator for mdformat using real processes and no cooperating source
    pub fn new(config: Arc<dyn ConfigSource>, notifier: Arc<dyn NotificationSink>) -> Self {
        let tool = ToolConfig::default();
        let resolver = RuntimeResolver::new(config.clone(), &tool);
        Self::with_parts(tool, config, resolver, Arc::new(ToolInvoker::new()), notifier)
    }

    /// Assemble from explicit parts; subscribes to the resolver's cooperating
    /// source so a runtime switch invalidates the cache
    pub fn with_parts(
        tool: ToolConfig,
        config: Arc<dyn ConfigSource>,
        resolver: RuntimeResolver,
        invoker: Arc<dyn Invoke>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let cache = Arc::new(AvailabilityCache::new());

        let subscription = resolver.plugin().map(|plugin| {
            let cache = Arc::clone(&cache);
            plugin.on_execution_details_changed(Arc::new(move || {
                log::debug!("Selected runtime changed; clearing availability verdict");
                cache.invalidate();
            }))
        });

        Self {
            tool,
            config,
            resolver,
            cache,
            invoker,
            notifier,
            _subscription: subscription,
        }
    }

    pub fn tool(&self) -> &ToolConfig {
        &self.tool
    }

    pub fn resolver(&self) -> &RuntimeResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<AvailabilityCache> {
        &self.cache
    }

    /// Format `input`; `Ok(None)` means the tool left it unchanged
    pub async fn format(
        &self,
        input: &str,
        hint: &ContextHint,
        options: &FormatOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<TextEdit>, FormatError> {
        let result = self.run_format(input, hint, options, cancel).await;
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    /// Format a document in place using options from the settings;
    /// returns whether the document changed
    pub async fn format_document(
        &self,
        document: &mut dyn DocumentSurface,
        hint: &ContextHint,
        cancel: &CancellationToken,
    ) -> Result<bool, FormatError> {
        let options = FormatOptions::from_config(self.config.as_ref());
        let text = document.text();

        match self.format(&text, hint, &options, cancel).await? {
            Some(edit) => {
                document.apply(edit);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Re-run resolution and a fresh availability check, reporting the result
    pub async fn check_installation(
        &self,
        hint: &ContextHint,
    ) -> Result<RuntimeCandidate, FormatError> {
        self.cache.invalidate();

        let result = self.resolve_available(hint).await;
        match &result {
            Ok(runtime) => self.notifier.info(&format!(
                "{} is installed for {}",
                self.tool.display_name, runtime
            )),
            Err(err) => self.report(err),
        }
        result
    }

    async fn run_format(
        &self,
        input: &str,
        hint: &ContextHint,
        options: &FormatOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<TextEdit>, FormatError> {
        let runtime = self.resolve_available(hint).await?;

        let request = InvocationRequest::new(runtime.clone(), format_args(&self.tool, options), input)
            .with_working_dir(hint.working_dir())
            .with_cancel(cancel.clone());

        match self.invoker.run(request).await {
            InvocationOutcome::Success(output) if output == input => {
                log::debug!("{} made no changes", self.tool.display_name);
                Ok(None)
            }
            InvocationOutcome::Success(output) => Ok(Some(TextEdit::replace_all(output))),
            InvocationOutcome::ProcessStartFailure(reason) => {
                self.cache.mark_unavailable(&runtime);
                Err(FormatError::ProcessStartFailure { runtime, reason })
            }
            InvocationOutcome::ToolReportedFailure { exit_code, stderr } => {
                Err(FormatError::ToolExitedWithError { exit_code, stderr })
            }
            InvocationOutcome::TerminatedBySignal(signal) => {
                Err(FormatError::TerminatedBySignal { signal })
            }
            InvocationOutcome::Cancelled => Err(FormatError::Cancelled),
        }
    }

    async fn resolve_available(&self, hint: &ContextHint) -> Result<RuntimeCandidate, FormatError> {
        let runtime = self
            .resolver
            .resolve(hint)
            .await
            .ok_or(FormatError::NoRuntimeFound)?;

        let available = self
            .cache
            .ensure_checked(&runtime, || self.verify(&runtime, hint))
            .await;

        if available {
            Ok(runtime)
        } else {
            Err(FormatError::ToolUnavailable {
                runtime,
                tool: self.tool.display_name,
                package: self.tool.package,
            })
        }
    }

    async fn verify(&self, runtime: &RuntimeCandidate, hint: &ContextHint) -> bool {
        let request = InvocationRequest::new(runtime.clone(), self.tool.version_args(), "")
            .with_working_dir(hint.working_dir());

        match self.invoker.run(request).await {
            InvocationOutcome::Success(version) => {
                log::debug!(
                    "{} {} available under {}",
                    self.tool.display_name,
                    version.trim(),
                    runtime
                );
                true
            }
            outcome => {
                log::info!(
                    "{} not available under {}: {:?}",
                    self.tool.display_name,
                    runtime,
                    outcome
                );
                false
            }
        }
    }

    fn report(&self, err: &FormatError) {
        if err.is_silent() {
            log::debug!("{}", err);
            return;
        }

        let message = err.to_string();
        log::debug!("Reporting failure: {:?}", err);
        match err {
            FormatError::NoRuntimeFound | FormatError::ToolUnavailable { .. } => {
                self.notifier.error(&message, Some(self.tool.docs_url))
            }
            _ => self.notifier.error(&message, None),
        }
    }
}
