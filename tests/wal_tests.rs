//! Tests for the file-backed WAL block implementation.

use fluxtrace::wal::FRAME_HEADER_LEN;
use fluxtrace::{FileWal, Wal};
use std::fs;
use tempfile::tempdir;
use uuid::Uuid;

#[test]
fn test_write_reports_monotonic_offsets() {
    let dir = tempdir().unwrap();
    let wal = FileWal::new(dir.path()).unwrap();
    let block = wal.new_block(Uuid::new_v4(), "tenant-1").unwrap();

    let (start1, len1) = block.write(b"hello").unwrap();
    let (start2, len2) = block.write(b"worlds!").unwrap();

    assert_eq!(start1, 0);
    assert_eq!(len1, FRAME_HEADER_LEN + 5);
    assert_eq!(start2, len1 as u64);
    assert_eq!(len2, FRAME_HEADER_LEN + 7);
}

#[test]
fn test_frames_are_length_and_crc_prefixed() {
    let dir = tempdir().unwrap();
    let wal = FileWal::new(dir.path()).unwrap();
    let id = Uuid::new_v4();
    let block = wal.new_block(id, "tenant-1").unwrap();

    let payload = b"span payload";
    let (_, len) = block.write(payload).unwrap();

    let path = dir.path().join(format!("{}+tenant-1", id));
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u32, len);
    assert_eq!(&bytes[0..4], &(payload.len() as u32).to_be_bytes());
    assert_eq!(&bytes[4..8], &crc32fast::hash(payload).to_be_bytes());
    assert_eq!(&bytes[8..], payload);
}

#[test]
fn test_clear_removes_file_and_is_idempotent() {
    let dir = tempdir().unwrap();
    let wal = FileWal::new(dir.path()).unwrap();
    let id = Uuid::new_v4();
    let block = wal.new_block(id, "tenant-1").unwrap();
    block.write(b"x").unwrap();

    let path = dir.path().join(format!("{}+tenant-1", id));
    assert!(path.exists());

    block.clear();
    assert!(!path.exists());
    block.clear();

    assert!(block.write(b"y").is_err());
}

#[test]
fn test_duplicate_block_id_is_rejected() {
    let dir = tempdir().unwrap();
    let wal = FileWal::new(dir.path()).unwrap();
    let id = Uuid::new_v4();
    wal.new_block(id, "tenant-1").unwrap();
    assert!(wal.new_block(id, "tenant-1").is_err());
}
