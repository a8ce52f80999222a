use crate::fingerprint::{fingerprint, TraceFingerprint};
use crate::limiter::Limiter;
use crate::metrics::{MetricsSink, TRACES_CREATED_TOTAL};
use crate::record::{insert_sorted, TraceRecord};
use crate::trace::{PushRequest, TraceBuffer};
use crate::wal::{Wal, WalBlock};
use crate::{IngestError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Per-tenant ingest orchestrator.
///
/// Owns the live trace set and the block under construction. Two lock
/// regions guard them; `cut_complete_traces` takes both, live set first.
/// That order is an invariant; every multi-lock path must follow it.
pub struct Instance {
    traces: Mutex<HashMap<TraceFingerprint, TraceBuffer>>,
    block: RwLock<BlockState>,

    tenant_id: String,
    limiter: Arc<Limiter>,
    wal: Arc<dyn Wal>,
    metrics: Arc<dyn MetricsSink>,
}

struct BlockState {
    records: Vec<TraceRecord>,
    wal_block: Option<Arc<dyn WalBlock>>,
    last_block_cut: Instant,
}

impl Instance {
    /// Build an instance and allocate its first block.
    pub fn new(
        tenant_id: impl Into<String>,
        limiter: Arc<Limiter>,
        wal: Arc<dyn Wal>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        let instance = Self {
            traces: Mutex::new(HashMap::new()),
            block: RwLock::new(BlockState {
                records: Vec::new(),
                wal_block: None,
                last_block_cut: Instant::now(),
            }),
            tenant_id: tenant_id.into(),
            limiter,
            wal,
            metrics,
        };
        instance.reset_block()?;
        Ok(instance)
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Number of traces currently live in memory.
    pub fn live_trace_count(&self) -> usize {
        self.traces.lock().len()
    }

    /// Absorb a batch of spans for one trace, creating its buffer on first
    /// contact (subject to the tenant's live-trace quota).
    pub fn push(&self, req: &PushRequest) -> Result<()> {
        // Upstream router separates spans by trace ID and filters empty
        // requests; the first span is authoritative for the whole batch.
        let trace_id = match req.spans.first() {
            Some(span) => span.trace_id.clone(),
            None => {
                return Err(IngestError::MalformedPayload(
                    "push request contains no spans".to_string(),
                ))
            }
        };
        let fp = fingerprint(&trace_id);

        let mut traces = self.traces.lock();
        let live = traces.len();
        match traces.entry(fp) {
            Entry::Occupied(mut entry) => entry.get_mut().append(req),
            Entry::Vacant(entry) => {
                self.limiter
                    .assert_max_traces_per_tenant(&self.tenant_id, live)?;
                self.metrics.inc_counter(TRACES_CREATED_TOTAL, &self.tenant_id);
                entry.insert(TraceBuffer::new(trace_id)).append(req)
            }
        }
    }

    /// Move idle traces out of the live set and into the current block.
    ///
    /// A trace is cut once it has been idle for at least `idle_cutoff`,
    /// judged against a single `now` snapshot taken at the start of the
    /// sweep, or unconditionally when `immediate` is set. A failed durable
    /// write aborts the sweep: the failing trace stays live for the next
    /// sweep, traces already cut in this sweep stay cut.
    pub fn cut_complete_traces(&self, idle_cutoff: Duration, immediate: bool) -> Result<()> {
        let mut traces = self.traces.lock();
        let mut block = self.block.write();

        let wal_block = match &block.wal_block {
            Some(b) => Arc::clone(b),
            None => {
                return Err(IngestError::BlockUnavailable(
                    "no open block; reset_block must succeed first".to_string(),
                ))
            }
        };

        let now = Instant::now();
        let cut: Vec<TraceFingerprint> = traces
            .iter()
            .filter(|(_, t)| immediate || now.duration_since(t.last_append()) >= idle_cutoff)
            .map(|(fp, _)| *fp)
            .collect();

        for fp in cut {
            let buffer = match traces.get(&fp) {
                Some(b) => b,
                None => continue,
            };
            let (start, length) = wal_block
                .write(buffer.content())
                .map_err(IngestError::BlockWrite)?;

            tracing::debug!(
                tenant = %self.tenant_id,
                trace_id = ?buffer.trace_id(),
                start,
                length,
                "cut trace into block"
            );
            insert_sorted(
                &mut block.records,
                TraceRecord {
                    trace_id: buffer.trace_id().clone(),
                    start,
                    length,
                },
            );
            traces.remove(&fp);
        }

        Ok(())
    }

    /// Whether the current block should be harvested: enough traces, or old
    /// enough. Advisory only; cuts may keep landing until reset.
    pub fn is_block_ready(&self, max_traces_per_block: usize, max_block_lifetime: Duration) -> bool {
        let block = self.block.read();
        block.records.len() >= max_traces_per_block
            || block.last_block_cut.elapsed() >= max_block_lifetime
    }

    /// Harvest the current block: its sorted index and WAL handle. Does not
    /// reset anything; the block stays valid until `reset_block`.
    pub fn get_block(&self) -> (Vec<TraceRecord>, Option<Arc<dyn WalBlock>>) {
        let block = self.block.write();
        (block.records.clone(), block.wal_block.clone())
    }

    /// Discard the current block and open a fresh one. On allocation failure
    /// the instance has no open block: pushes still work, cuts fail until a
    /// retry succeeds.
    pub fn reset_block(&self) -> Result<()> {
        let mut block = self.block.write();

        block.records = Vec::new();
        if let Some(old) = block.wal_block.take() {
            old.clear();
        }

        let block_id = Uuid::new_v4();
        let new_block = self
            .wal
            .new_block(block_id, &self.tenant_id)
            .map_err(IngestError::BlockAllocation)?;
        tracing::info!(tenant = %self.tenant_id, block = %block_id, "opened new wal block");

        block.wal_block = Some(new_block);
        block.last_block_cut = Instant::now();
        Ok(())
    }
}
