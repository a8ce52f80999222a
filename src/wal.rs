use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Frame header: u32 payload length + u32 crc32 of the payload.
pub const FRAME_HEADER_LEN: u32 = 8;

/// An open append-only block. Offsets are block-relative and monotonic for
/// the lifetime of the handle.
pub trait WalBlock: Send + Sync {
    fn id(&self) -> Uuid;

    /// Append one trace's accumulated content; returns the start offset and
    /// total framed length of what was written.
    fn write(&self, content: &[u8]) -> io::Result<(u64, u32)>;

    /// Dispose of the block's resources. Safe to call more than once;
    /// subsequent writes fail.
    fn clear(&self);
}

/// Allocator of fresh append-only blocks.
pub trait Wal: Send + Sync {
    fn new_block(&self, block_id: Uuid, tenant: &str) -> io::Result<Arc<dyn WalBlock>>;
}

/// WAL keeping one file per block under a root directory.
pub struct FileWal {
    root: PathBuf,
}

impl FileWal {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Wal for FileWal {
    fn new_block(&self, block_id: Uuid, tenant: &str) -> io::Result<Arc<dyn WalBlock>> {
        let path = self.root.join(format!("{}+{}", block_id, tenant));
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;
        Ok(Arc::new(FileWalBlock {
            id: block_id,
            path,
            inner: Mutex::new(Inner {
                file: Some(file),
                offset: 0,
            }),
        }))
    }
}

struct Inner {
    file: Option<File>,
    offset: u64,
}

struct FileWalBlock {
    id: Uuid,
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl WalBlock for FileWalBlock {
    fn id(&self) -> Uuid {
        self.id
    }

    fn write(&self, content: &[u8]) -> io::Result<(u64, u32)> {
        let mut inner = self.inner.lock();
        let Inner { file, offset } = &mut *inner;
        let f = file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "wal block closed"))?;

        // `offset` is the end of the last complete frame. A failed write may
        // have left a torn tail past it; drop that before appending so the
        // reported start matches the file position.
        if f.metadata()?.len() != *offset {
            f.set_len(*offset)?;
        }

        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN as usize + content.len());
        frame.extend_from_slice(&(content.len() as u32).to_be_bytes());
        frame.extend_from_slice(&crc32fast::hash(content).to_be_bytes());
        frame.extend_from_slice(content);

        if let Err(e) = f.write_all(&frame).and_then(|_| f.flush()) {
            if f.set_len(*offset).is_err() {
                // frame boundary unrecoverable; close the handle rather
                // than let a later write index into the torn frame
                *file = None;
            }
            return Err(e);
        }

        let start = *offset;
        let length = frame.len() as u32;
        *offset += length as u64;
        Ok((start, length))
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.file = None;
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(block = %self.id, error = %e, "failed to remove wal block file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_truncates_torn_tail_before_appending() {
        let dir = tempdir().unwrap();
        let wal = FileWal::new(dir.path()).unwrap();
        let id = Uuid::new_v4();
        let block = wal.new_block(id, "tenant-1").unwrap();

        let (_, len1) = block.write(b"first").unwrap();
        let path = dir.path().join(format!("{}+tenant-1", id));
        let good = fs::read(&path).unwrap();

        // Half a frame left behind by an interrupted write.
        let mut raw = OpenOptions::new().append(true).open(&path).unwrap();
        raw.write_all(&[0xab, 0xcd, 0xef]).unwrap();

        let (start2, len2) = block.write(b"second").unwrap();
        assert_eq!(start2, len1 as u64);

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, start2 + len2 as u64);
        assert_eq!(&bytes[..good.len()], good.as_slice());
        assert_eq!(&bytes[good.len()..good.len() + 4], &6u32.to_be_bytes());
    }

    #[test]
    fn test_unwritable_handle_fails_without_advancing_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("block");
        fs::write(&path, b"").unwrap();

        // Read-only handle: the append fails and the rollback cannot run
        // either, so the block must close itself.
        let block = FileWalBlock {
            id: Uuid::new_v4(),
            path: path.clone(),
            inner: Mutex::new(Inner {
                file: Some(File::open(&path).unwrap()),
                offset: 0,
            }),
        };

        assert!(block.write(b"payload").is_err());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        let err = block.write(b"payload").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
