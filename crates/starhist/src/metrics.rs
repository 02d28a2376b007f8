//! Observability counters for the collector.
//!
//! Counters are behavior-neutral: they record how often conditional
//! requests paid off and how often the API pushed back, nothing more.
//! The sink is injected rather than referenced as ambient global state,
//! so tests and embedders can observe or discard the numbers as they
//! see fit.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives collector events worth counting.
pub trait MetricsSink: Send + Sync {
    /// A conditional request answered 304 Not Modified.
    fn cache_hit(&self);
    /// The API answered 403 rate-limit-exceeded.
    fn rate_limit_hit(&self);
}

/// Discards all events. The default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn cache_hit(&self) {}
    fn rate_limit_hit(&self) {}
}

/// Point-in-time view of [`AtomicMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub rate_limit_hits: u64,
}

/// Process-wide counters with atomic increment semantics.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    cache_hits: AtomicU64,
    rate_limit_hits: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            rate_limit_hits: self.rate_limit_hits.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for AtomicMetrics {
    fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn rate_limit_hit(&self) {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
    }
}
