//! Read position within a scanned resource

/// Byte cursor owned by a single scan.
///
/// `position` only ever moves forward, and only by the number of bytes a
/// read actually returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor {
    position: u64,
    chunk_size: usize,
    reads: u64,
}

impl ScanCursor {
    /// Create a cursor at offset 0. `chunk_size` must be non-zero.
    pub fn new(chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            position: 0,
            chunk_size,
            reads: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of completed reads, including a terminal empty read.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Record a completed read of `bytes_read` bytes.
    pub fn advance(&mut self, bytes_read: usize) {
        debug_assert!(bytes_read <= self.chunk_size);
        self.reads += 1;
        self.position += bytes_read as u64;
    }
}
