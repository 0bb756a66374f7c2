//! Delivery targets for scanned chunks
//!
//! A [`Sink`] receives each chunk exactly once. Sinks never fail loudly:
//! every problem is folded into [`DeliveryOutcome::Failed`] so the scan
//! that dispatched the chunk is never affected by it.

pub mod http;

pub use http::HttpSink;

use std::future::Future;

use crate::pipeline::Chunk;

/// Result of handing one chunk to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The sink accepted the chunk
    Delivered { status_code: u16, body: String },
    /// Transport error, timeout, or rejection
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        DeliveryOutcome::Failed { reason: reason.into() }
    }
}

/// Something that can take delivery of a chunk.
///
/// Implementations must return in bounded time and must not panic.
pub trait Sink: Send + Sync + 'static {
    fn deliver(&self, chunk: Chunk) -> impl Future<Output = DeliveryOutcome> + Send;
}
