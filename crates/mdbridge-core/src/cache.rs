//! Memoized tool availability
//!
//! Verifying that the formatter is installed costs a subprocess round-trip,
//! so a positive verdict is remembered for the runtime that produced it.
//! Negative verdicts are never trusted: the user may have installed the tool
//! since, so they are re-verified on every request.

use crate::runtime::RuntimeCandidate;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Whether the tool answered under a runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verdict {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

#[derive(Debug, Default)]
struct CacheState {
    last_checked: Option<RuntimeCandidate>,
    verdict: Verdict,
}

/// Availability verdict paired with the runtime it was produced for
#[derive(Debug, Default)]
pub struct AvailabilityCache {
    state: Mutex<CacheState>,
}

impl AvailabilityCache {
    /// Fresh cache: no runtime checked, verdict unknown
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current (runtime, verdict) pair, read together
    pub fn snapshot(&self) -> (Option<RuntimeCandidate>, Verdict) {
        let state = self.lock();
        (state.last_checked.clone(), state.verdict)
    }

    /// Verdict as it applies to `candidate`; a verdict for another runtime reads as unknown
    pub fn verdict_for(&self, candidate: &RuntimeCandidate) -> Verdict {
        let state = self.lock();
        if state.last_checked.as_ref() == Some(candidate) {
            state.verdict
        } else {
            Verdict::Unknown
        }
    }

    /// Return whether the tool is available under `candidate`, running
    /// `verifier` unless a positive verdict for this exact runtime is cached
    pub async fn ensure_checked<F, Fut>(&self, candidate: &RuntimeCandidate, verifier: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.verdict_for(candidate) == Verdict::Available {
            log::debug!("Availability cached for {}", candidate);
            return true;
        }

        let available = verifier().await;
        let verdict = if available {
            Verdict::Available
        } else {
            Verdict::Unavailable
        };
        self.record(candidate, verdict);
        available
    }

    /// Force the next request to re-verify; the runtime field is kept
    pub fn invalidate(&self) {
        self.lock().verdict = Verdict::Unknown;
    }

    /// Record that `candidate` could not even be started
    pub fn mark_unavailable(&self, candidate: &RuntimeCandidate) {
        self.record(candidate, Verdict::Unavailable);
    }

    fn record(&self, candidate: &RuntimeCandidate, verdict: Verdict) {
        let mut state = self.lock();
        state.last_checked = Some(candidate.clone());
        state.verdict = verdict;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_verifier(
        calls: &AtomicUsize,
        result: bool,
    ) -> impl FnOnce() -> std::future::Ready<bool> + '_ {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(result)
        }
    }

    #[tokio::test]
    async fn test_starts_unknown() {
        let cache = AvailabilityCache::new();
        assert_eq!(cache.snapshot(), (None, Verdict::Unknown));
    }

    #[tokio::test]
    async fn test_available_verdict_is_reused() {
        let cache = AvailabilityCache::new();
        let python = RuntimeCandidate::new("python3");
        let calls = AtomicUsize::new(0);

        assert!(cache.ensure_checked(&python, counting_verifier(&calls, true)).await);
        for _ in 0..5 {
            assert!(cache.ensure_checked(&python, counting_verifier(&calls, false)).await);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.snapshot(), (Some(python), Verdict::Available));
    }

    #[tokio::test]
    async fn test_unavailable_is_always_rechecked() {
        let cache = AvailabilityCache::new();
        let python = RuntimeCandidate::new("python3");
        let calls = AtomicUsize::new(0);

        assert!(!cache.ensure_checked(&python, counting_verifier(&calls, false)).await);
        assert!(!cache.ensure_checked(&python, counting_verifier(&calls, false)).await);
        // Tool installed in the meantime
        assert!(cache.ensure_checked(&python, counting_verifier(&calls, true)).await);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_runtime_change_triggers_recheck() {
        let cache = AvailabilityCache::new();
        let system = RuntimeCandidate::new("python3");
        let venv = RuntimeCandidate::new("/venv/bin/python");
        let calls = AtomicUsize::new(0);

        assert!(cache.ensure_checked(&system, counting_verifier(&calls, true)).await);
        assert!(!cache.ensure_checked(&venv, counting_verifier(&calls, false)).await);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.snapshot(), (Some(venv), Verdict::Unavailable));
        assert_eq!(cache.verdict_for(&system), Verdict::Unknown);
    }

    #[tokio::test]
    async fn test_invalidate_keeps_runtime_and_forces_recheck() {
        let cache = AvailabilityCache::new();
        let python = RuntimeCandidate::new("python3");
        let calls = AtomicUsize::new(0);

        cache.ensure_checked(&python, counting_verifier(&calls, true)).await;
        cache.invalidate();

        assert_eq!(cache.snapshot(), (Some(python.clone()), Verdict::Unknown));
        assert!(cache.ensure_checked(&python, counting_verifier(&calls, true)).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mark_unavailable_overrides_available() {
        let cache = AvailabilityCache::new();
        let python = RuntimeCandidate::new("python3");
        let calls = AtomicUsize::new(0);

        cache.ensure_checked(&python, counting_verifier(&calls, true)).await;
        cache.mark_unavailable(&python);

        assert_eq!(cache.verdict_for(&python), Verdict::Unavailable);
        cache.ensure_checked(&python, counting_verifier(&calls, true)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
