//! Exit status codes for the CLI
//!
//! chunkpost follows standard Unix exit code conventions:
//! - 0: Success
//! - 1: Any error (unreadable file, failed read, bad config, lock held, ...)
//! - 130: User interrupted (Ctrl+C, standard SIGINT exit code)
//!
//! Delivery failures during a scan are not errors: the scan still
//! succeeds when every chunk was read.

use std::process::{ExitCode, Termination};

/// Exit status codes following standard Unix conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Successful execution
    Success = 0,
    /// Any error
    Error = 1,
    /// User interrupted (Ctrl+C) - standard SIGINT code
    Interrupted = 130,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        self.into()
    }
}
