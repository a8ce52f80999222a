use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Index entry for a trace that has been durably written into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub trace_id: Bytes,
    /// Byte offset of the trace's content within the block.
    pub start: u64,
    /// Length in bytes of the trace's content within the block.
    pub length: u32,
}

/// Insert a record into a sequence kept sorted by trace ID (lexicographic
/// byte order, no duplicates).
///
/// A record for an already-indexed trace ID replaces the old entry; the
/// superseded bytes stay in the block but are no longer reachable through
/// the index. Linear shifting is fine at per-block record counts.
pub fn insert_sorted(records: &mut Vec<TraceRecord>, record: TraceRecord) {
    match records.binary_search_by(|r| r.trace_id.as_ref().cmp(record.trace_id.as_ref())) {
        Ok(idx) => records[idx] = record,
        Err(idx) => records.insert(idx, record),
    }
}
