//! Chunk values produced by a scan

use bytes::Bytes;
use std::fmt;

/// One window of the resource, produced by a single successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    index: u64,
    offset: u64,
    bytes: Bytes,
    text: String,
}

impl Chunk {
    /// Build a chunk from raw bytes, decoding them as UTF-8.
    ///
    /// Each window is decoded on its own, so a multi-byte character split
    /// across two windows becomes U+FFFD on both sides.
    pub fn new(index: u64, offset: u64, bytes: Bytes) -> Self {
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Self {
            index,
            offset,
            bytes,
            text,
        }
    }

    /// Zero-based position of this chunk in the scan
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Byte offset of the first byte of this chunk
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of bytes read
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
