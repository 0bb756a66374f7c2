//! The read-pace-deliver loop

use bytes::Bytes;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::chunk::Chunk;
use super::cursor::ScanCursor;
use super::report::ScanReport;
use crate::errors::{ChunkpostError, Result};
use crate::sink::{DeliveryOutcome, Sink};

/// Bytes requested per read unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Pause between reads unless configured otherwise
pub const DEFAULT_INTER_CHUNK_DELAY: Duration = Duration::from_millis(300);

/// Upper bound on the buffer reserved before a window is read; larger
/// windows grow as data arrives.
const MAX_INITIAL_WINDOW_CAPACITY: usize = 64 * 1024;

/// Pacing parameters for a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub chunk_size: usize,
    pub inter_chunk_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            inter_chunk_delay: DEFAULT_INTER_CHUNK_DELAY,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkpostError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Exclusive handle on the resource being scanned.
///
/// Consumed by [`ChunkedDeliveryPipeline::scan`]; the underlying reader is
/// closed when the scan ends, whichever way it ends.
#[derive(Debug)]
pub struct ScanHandle<R> {
    reader: R,
    source: String,
}

impl ScanHandle<File> {
    /// Open a file for scanning.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unavailable = |source: io::Error| ChunkpostError::ResourceUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).await.map_err(unavailable)?;
        let metadata = file.metadata().await.map_err(unavailable)?;
        if metadata.is_dir() {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::IsADirectory,
                "is a directory",
            )));
        }

        debug!(path = %path.display(), size = metadata.len(), "Opened resource");

        Ok(Self {
            reader: file,
            source: path.display().to_string(),
        })
    }
}

impl<R: AsyncRead + Unpin> ScanHandle<R> {
    /// Wrap an already-open reader. `source` names it in logs.
    pub fn from_reader(reader: R, source: impl Into<String>) -> Self {
        Self {
            reader,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Reads a resource in fixed-size windows and hands each window to a sink.
///
/// Deliveries run as independent tasks. The loop never waits on one, so
/// scan throughput depends only on the inter-chunk delay.
pub struct ChunkedDeliveryPipeline<S> {
    sink: Arc<S>,
    options: PipelineOptions,
}

impl<S: Sink> ChunkedDeliveryPipeline<S> {
    pub fn new(sink: S, options: PipelineOptions) -> Result<Self> {
        Self::with_shared_sink(Arc::new(sink), options)
    }

    /// Use a sink that the caller keeps a reference to (e.g. to inspect it afterwards).
    pub fn with_shared_sink(sink: Arc<S>, options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { sink, options })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Scan `handle` until it is exhausted or a read fails.
    ///
    /// On exhaustion, waits for the deliveries still in flight and returns a
    /// summary. On a read error, returns [`ChunkpostError::ReadFailure`]
    /// straight away; in-flight deliveries are left running in the background.
    pub async fn scan<R>(&self, handle: ScanHandle<R>) -> Result<ScanReport>
    where
        R: AsyncRead + Unpin,
    {
        let ScanHandle { mut reader, source } = handle;
        let PipelineOptions {
            chunk_size,
            inter_chunk_delay,
        } = self.options;

        let mut cursor = ScanCursor::new(chunk_size);
        let mut deliveries: JoinSet<DeliveryOutcome> = JoinSet::new();
        let mut report = ScanReport::default();
        let started = Instant::now();

        info!(
            source = %source,
            chunk_size,
            delay = %humantime::format_duration(inter_chunk_delay),
            "Starting scan"
        );

        loop {
            let mut window = Vec::with_capacity(chunk_size.min(MAX_INITIAL_WINDOW_CAPACITY));
            let bytes_read = match read_window(&mut reader, chunk_size, &mut window).await {
                Ok(n) => n,
                Err(e) => {
                    let position = cursor.position() + window.len() as u64;
                    error!(source = %source, position, discarded = window.len(), error = %e, "Error reading resource");
                    drop(reader);
                    deliveries.detach_all();
                    return Err(ChunkpostError::ReadFailure { position, source: e });
                }
            };

            if bytes_read == 0 {
                cursor.advance(0);
                break;
            }

            let chunk = Chunk::new(
                report.chunks,
                cursor.position(),
                Bytes::from(window),
            );
            info!(
                index = chunk.index(),
                offset = chunk.offset(),
                len = chunk.len(),
                "{}",
                chunk.text()
            );

            self.dispatch(&mut deliveries, chunk);
            report.chunks += 1;
            cursor.advance(bytes_read);

            while let Some(result) = deliveries.try_join_next() {
                report.record(result);
            }

            if inter_chunk_delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(inter_chunk_delay).await;
            }
        }

        drop(reader);
        report.reads = cursor.reads();
        report.bytes = cursor.position();
        report.scan_duration = started.elapsed();
        info!(source = %source, bytes = report.bytes, chunks = report.chunks, "Finished reading resource");

        if !deliveries.is_empty() {
            debug!(pending = deliveries.len(), "Waiting for in-flight deliveries");
        }
        while let Some(result) = deliveries.join_next().await {
            report.record(result);
        }

        Ok(report)
    }

    fn dispatch(&self, deliveries: &mut JoinSet<DeliveryOutcome>, chunk: Chunk) {
        let sink = Arc::clone(&self.sink);
        deliveries.spawn(async move {
            let index = chunk.index();
            let outcome = sink.deliver(chunk).await;
            match &outcome {
                DeliveryOutcome::Delivered { status_code, body } => {
                    info!(index, status = status_code, body = %body, "Chunk delivered");
                }
                DeliveryOutcome::Failed { reason } => {
                    warn!(index, reason = %reason, "Chunk delivery failed");
                }
            }
            outcome
        });
    }
}

/// Fill `window` with up to `chunk_size` bytes, stopping early only at end
/// of input. A single `read` may return less than asked for (tokio files
/// cap each read), so one window can take several reads.
async fn read_window<R>(reader: &mut R, chunk_size: usize, window: &mut Vec<u8>) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let limit = u64::try_from(chunk_size).unwrap_or(u64::MAX);
    reader.take(limit).read_to_end(window).await
}
