use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one ingester instance set.
///
/// Durations are expressed in seconds so the struct stays flat for
/// file/env-based deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngesterConfig {
    /// Default cap on concurrently live traces for a tenant.
    pub max_traces_per_tenant: usize,
    /// A trace with no appends for this long is cut into the block.
    pub trace_idle_period_secs: u64,
    /// A block older than this is ready to ship regardless of size.
    pub max_block_duration_secs: u64,
    /// A block holding this many traces is ready to ship.
    pub max_traces_per_block: usize,
    /// Root directory for WAL block files.
    pub wal_path: PathBuf,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self {
            max_traces_per_tenant: 10_000,
            trace_idle_period_secs: 30,
            max_block_duration_secs: 3_600,
            max_traces_per_block: 50_000,
            wal_path: PathBuf::from("/var/fluxtrace/wal"),
        }
    }
}

impl IngesterConfig {
    pub fn trace_idle_period(&self) -> Duration {
        Duration::from_secs(self.trace_idle_period_secs)
    }

    pub fn max_block_duration(&self) -> Duration {
        Duration::from_secs(self.max_block_duration_secs)
    }
}
