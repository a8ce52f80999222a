use crate::{IngestError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::time::Instant;

/// One span's worth of already-encoded payload for a trace.
#[derive(Debug, Clone)]
pub struct Span {
    pub trace_id: Bytes,
    pub payload: Bytes,
}

/// A tenant-scoped batch of spans, all belonging to a single trace.
///
/// The upstream router guarantees the single-trace property and that at
/// least one span is present; the core re-checks the former because a
/// violation would silently corrupt a buffer.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub tenant: String,
    pub spans: Vec<Span>,
}

/// A live trace still being assembled in memory.
///
/// Content is an opaque accumulation of span payloads, framed with a u32
/// length prefix per span so the block's reader can split them back apart.
pub struct TraceBuffer {
    trace_id: Bytes,
    last_append: Instant,
    content: BytesMut,
}

impl TraceBuffer {
    pub fn new(trace_id: Bytes) -> Self {
        Self {
            trace_id,
            last_append: Instant::now(),
            content: BytesMut::new(),
        }
    }

    pub fn trace_id(&self) -> &Bytes {
        &self.trace_id
    }

    pub fn last_append(&self) -> Instant {
        self.last_append
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Fold a request's spans into the accumulated content.
    ///
    /// Validation happens before any mutation: a mismatched trace ID fails
    /// the whole append and leaves the existing content untouched.
    pub fn append(&mut self, req: &PushRequest) -> Result<()> {
        for span in &req.spans {
            if span.trace_id != self.trace_id {
                return Err(IngestError::MalformedPayload(format!(
                    "span trace id {:x?} does not match buffer trace id {:x?}",
                    span.trace_id, self.trace_id
                )));
            }
        }

        for span in &req.spans {
            self.content.put_u32(span.payload.len() as u32);
            self.content.put_slice(&span.payload);
        }
        self.last_append = Instant::now();
        Ok(())
    }
}
