use crate::{IngestError, Result};
use dashmap::DashMap;
use std::sync::Arc;

/// Per-tenant cap on concurrently live traces.
///
/// Consulted only when a push would create a brand-new trace; appends to an
/// existing trace are never limited.
pub struct Limiter {
    default_max_traces: usize,
    overrides: Arc<DashMap<String, usize>>,
}

impl Limiter {
    pub fn new(default_max_traces: usize) -> Self {
        Self {
            default_max_traces,
            overrides: Arc::new(DashMap::new()),
        }
    }

    /// Set a tenant-specific limit that takes precedence over the default.
    pub fn set_override(&self, tenant: impl Into<String>, max_traces: usize) {
        self.overrides.insert(tenant.into(), max_traces);
    }

    pub fn max_traces_for(&self, tenant: &str) -> usize {
        self.overrides
            .get(tenant)
            .map(|limit| *limit.value())
            .unwrap_or(self.default_max_traces)
    }

    /// Err when creating one more live trace would exceed the tenant's limit.
    pub fn assert_max_traces_per_tenant(&self, tenant: &str, live_count: usize) -> Result<()> {
        let limit = self.max_traces_for(tenant);
        if live_count >= limit {
            return Err(IngestError::TraceLimitExceeded {
                tenant: tenant.to_string(),
                limit,
            });
        }
        Ok(())
    }
}
