use xxhash_rust::xxh3::xxh3_64;

/// In-memory map key for a live trace. Never persisted; collisions are not
/// specially handled.
pub type TraceFingerprint = u64;

/// Hash an opaque trace ID into its fixed-width fingerprint.
pub fn fingerprint(trace_id: &[u8]) -> TraceFingerprint {
    xxh3_64(trace_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let id = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(fingerprint(&id), fingerprint(&id));
    }

    #[test]
    fn test_fingerprint_distinguishes_ids() {
        assert_ne!(fingerprint(b"trace-a"), fingerprint(b"trace-b"));
    }
}
