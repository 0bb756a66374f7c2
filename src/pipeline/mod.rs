//! Chunked file streaming with paced, fire-and-forget delivery

pub mod chunk;
pub mod cursor;
pub mod report;
pub mod scan;

pub use chunk::Chunk;
pub use cursor::ScanCursor;
pub use report::ScanReport;
pub use scan::{
    ChunkedDeliveryPipeline, PipelineOptions, ScanHandle, DEFAULT_CHUNK_SIZE,
    DEFAULT_INTER_CHUNK_DELAY,
};
