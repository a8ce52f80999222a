use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter name for traces created, labeled by tenant.
pub const TRACES_CREATED_TOTAL: &str = "ingester_traces_created_total";

/// Narrow metrics capability injected into an `Instance` at construction.
///
/// The core only ever increments tenant-labeled counters; exporting them is
/// the embedding process's concern.
pub trait MetricsSink: Send + Sync {
    fn inc_counter(&self, name: &'static str, tenant: &str);
}

/// Sink that drops every increment. Useful in tests and tooling.
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn inc_counter(&self, _name: &'static str, _tenant: &str) {}
}

/// In-process sink keyed by `(counter, tenant)`, readable by a scraper.
pub struct AtomicMetrics {
    counters: Arc<DashMap<(&'static str, String), AtomicU64>>,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, name: &'static str, tenant: &str) -> u64 {
        self.counters
            .get(&(name, tenant.to_string()))
            .map(|c| c.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Default for AtomicMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for AtomicMetrics {
    fn inc_counter(&self, name: &'static str, tenant: &str) {
        self.counters
            .entry((name, tenant.to_string()))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }
}
