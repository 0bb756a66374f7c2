//! Scan summary

use std::fmt;
use std::time::Duration;
use tokio::task::JoinError;

use crate::sink::DeliveryOutcome;

/// Summary of a scan that ran to exhaustion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Reads performed, including the terminal empty read
    pub reads: u64,
    /// Chunks produced and dispatched
    pub chunks: u64,
    /// Final cursor position, i.e. total bytes read
    pub bytes: u64,
    /// Deliveries the sink accepted
    pub delivered: u64,
    /// Deliveries that failed (including panicked delivery tasks)
    pub failed: u64,
    /// Time spent in the read loop, not counting the wait for in-flight deliveries
    pub scan_duration: Duration,
}

impl ScanReport {
    pub(crate) fn record(&mut self, result: Result<DeliveryOutcome, JoinError>) {
        match result {
            Ok(outcome) if outcome.is_delivered() => self.delivered += 1,
            Ok(_) => self.failed += 1,
            Err(e) => {
                tracing::warn!(error = %e, "Delivery task did not complete");
                self.failed += 1;
            }
        }
    }

    /// Deliveries that have settled either way
    pub fn settled(&self) -> u64 {
        self.delivered + self.failed
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunks ({} bytes) in {} reads over {}; {} delivered, {} failed",
            self.chunks,
            self.bytes,
            self.reads,
            humantime::format_duration(truncate_millis(self.scan_duration)),
            self.delivered,
            self.failed,
        )
    }
}

fn truncate_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}
