//! Diagnostic observers for resolution events.
//!
//! Observers are notified while a container constructs a definition it owns:
//! when construction starts, when it settles (successfully or not) and when it
//! is still pending after the container's slow-construction threshold. Cached hits do
//! not produce events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::definition::Definition;
use crate::error::DiError;

/// Observer of resolution events.
///
/// Calls are made synchronously from inside the construction future, so
/// implementations should stay cheap.
///
/// # Examples
///
/// ```
/// use blueprint_di::{Container, Definition, ResolutionObserver};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl ResolutionObserver for PrintObserver {
///     fn resolving(&self, definition: &Definition) {
///         println!("resolving {}", definition.name());
///     }
///
///     fn resolved(&self, definition: &Definition, duration: Duration) {
///         println!("resolved {} in {:?}", definition.name(), duration);
///     }
/// }
///
/// let container = Container::new();
/// container.add_observer(Arc::new(PrintObserver));
/// ```
pub trait ResolutionObserver: Send + Sync {
    /// Construction of `definition` is starting.
    fn resolving(&self, definition: &Definition);

    /// Construction of `definition` succeeded after `duration`.
    fn resolved(&self, definition: &Definition, duration: Duration);

    /// Construction of `definition` failed after `duration`.
    fn failed(&self, definition: &Definition, error: &DiError, duration: Duration) {
        let _ = (definition, error, duration);
    }

    /// Construction of `definition` is still pending once the slow threshold
    /// has elapsed. Fires at most once per construction.
    fn slow_construction(&self, definition: &Definition, elapsed: Duration) {
        let _ = (definition, elapsed);
    }
}

/// Registered observers of one container.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn ResolutionObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, definition: &Definition) {
        for observer in &self.observers {
            observer.resolving(definition);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, definition: &Definition, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(definition, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, definition: &Definition, error: &DiError, duration: Duration) {
        for observer in &self.observers {
            observer.failed(definition, error, duration);
        }
    }

    #[inline]
    pub(crate) fn slow_construction(&self, definition: &Definition, elapsed: Duration) {
        for observer in &self.observers {
            observer.slow_construction(definition, elapsed);
        }
    }
}

/// Observer emitting `tracing` events.
///
/// Starts and successes are logged at `debug`, failures at `warn`.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    label: Option<String>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer whose events carry `label`, e.g. to tell scopes apart.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()) }
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("container")
    }
}

impl ResolutionObserver for TracingObserver {
    fn resolving(&self, definition: &Definition) {
        tracing::debug!(scope = self.label(), service = %definition.name(), "resolving service");
    }

    fn resolved(&self, definition: &Definition, duration: Duration) {
        tracing::debug!(
            scope = self.label(),
            service = %definition.name(),
            elapsed_us = duration.as_micros() as u64,
            "service resolved"
        );
    }

    fn failed(&self, definition: &Definition, error: &DiError, duration: Duration) {
        tracing::warn!(
            scope = self.label(),
            service = %definition.name(),
            code = error.code().as_str(),
            elapsed_us = duration.as_micros() as u64,
            "service resolution failed: {}",
            error
        );
    }

    fn slow_construction(&self, definition: &Definition, elapsed: Duration) {
        tracing::info!(
            scope = self.label(),
            service = %definition.name(),
            elapsed_ms = elapsed.as_millis() as u64,
            "slow service construction"
        );
    }
}

/// Observer counting resolutions and accumulating construction time.
pub struct MetricsObserver {
    resolution_count: AtomicU64,
    failure_count: AtomicU64,
    slow_count: AtomicU64,
    total_resolution_time: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self {
            resolution_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            slow_count: AtomicU64::new(0),
            total_resolution_time: AtomicU64::new(0),
        }
    }

    /// Successful constructions observed.
    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn slow_count(&self) -> u64 {
        self.slow_count.load(Ordering::Relaxed)
    }

    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_resolution_time.load(Ordering::Relaxed))
    }

    /// Average time of successful constructions.
    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        let total_ns = self.total_resolution_time.load(Ordering::Relaxed);
        Some(Duration::from_nanos(total_ns / count))
    }

    pub fn reset(&self) {
        self.resolution_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.slow_count.store(0, Ordering::Relaxed);
        self.total_resolution_time.store(0, Ordering::Relaxed);
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionObserver for MetricsObserver {
    fn resolving(&self, _definition: &Definition) {}

    fn resolved(&self, _definition: &Definition, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_time
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn failed(&self, _definition: &Definition, _error: &DiError, _duration: Duration) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    fn slow_construction(&self, _definition: &Definition, _elapsed: Duration) {
        self.slow_count.fetch_add(1, Ordering::Relaxed);
    }
}
