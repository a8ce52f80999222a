pub mod config;
pub mod fingerprint;
pub mod instance;
pub mod limiter;
pub mod metrics;
pub mod record;
pub mod trace;
pub mod util;
pub mod wal;

use thiserror::Error;

pub use config::IngesterConfig;
pub use instance::Instance;
pub use limiter::Limiter;
pub use metrics::{AtomicMetrics, MetricsSink, NoopMetrics, TRACES_CREATED_TOTAL};
pub use record::TraceRecord;
pub use trace::{PushRequest, Span, TraceBuffer};
pub use util::Context;
pub use wal::{FileWal, Wal, WalBlock};

/// Core error type for the ingest write path
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("max live traces per tenant exceeded: tenant {tenant} is at its limit of {limit}")]
    TraceLimitExceeded { tenant: String, limit: usize },
    #[error("malformed push payload: {0}")]
    MalformedPayload(String),
    #[error("wal block write failed: {0}")]
    BlockWrite(#[source] std::io::Error),
    #[error("wal block allocation failed: {0}")]
    BlockAllocation(#[source] std::io::Error),
    #[error("no wal block available: {0}")]
    BlockUnavailable(String),
}

impl IngestError {
    /// HTTP status equivalent for the wire layer that fronts this core.
    pub fn http_status(&self) -> u16 {
        match self {
            IngestError::TraceLimitExceeded { .. } => 429,
            IngestError::MalformedPayload(_) => 400,
            _ => 500,
        }
    }

    /// Whether the caller should retry the same operation unchanged.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            IngestError::TraceLimitExceeded { .. }
                | IngestError::BlockWrite(_)
                | IngestError::BlockAllocation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
