//! Transfer status taxonomy and error classification
//!
//! A completed transfer carries a [`TransferStatus`]; [`classify`] turns it
//! into the [`Disposition`] that decides what the owning stream does next.
//! The streams survive every fault short of [`Disposition::Shutdown`] by
//! resubmitting, trading a dropped frame for availability.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Completion status of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Transfer completed, payload is valid
    Success,
    /// Transfer did not complete in time
    TimedOut,
    /// Endpoint answered with a protocol stall
    Stall,
    /// Transfer was aborted by an explicit cancel
    Cancelled,
    /// Device was removed
    Disconnected,
    /// I/O path is shutting down
    Shutdown,
    /// Device sent more data than requested
    Overflow,
    /// Low-level I/O failure
    Io,
    /// Anything else the transport reports
    Other,
}

/// What a stream does with a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Decode the payload, emit events, resubmit
    Deliver,
    /// Transient; log at debug, emit nothing, resubmit
    Ignore,
    /// Owning session is being torn down; stop silently
    Shutdown,
    /// Skip this step but keep the cycle going
    Stall,
    /// Log at error, emit nothing, keep the cycle going
    Unexpected,
}

impl Disposition {
    /// Whether the stream submits its next request after this completion
    pub const fn resubmits(self) -> bool {
        !matches!(self, Disposition::Shutdown)
    }

    /// Whether the payload is decoded
    pub const fn delivers(self) -> bool {
        matches!(self, Disposition::Deliver)
    }
}

/// Map a completion status to the stream's next action
pub const fn classify(status: TransferStatus) -> Disposition {
    match status {
        TransferStatus::Success => Disposition::Deliver,
        TransferStatus::TimedOut => Disposition::Ignore,
        TransferStatus::Stall => Disposition::Stall,
        TransferStatus::Cancelled | TransferStatus::Disconnected | TransferStatus::Shutdown => {
            Disposition::Shutdown
        }
        TransferStatus::Overflow | TransferStatus::Io | TransferStatus::Other => {
            Disposition::Unexpected
        }
    }
}

/// Failure to hand a request to the transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Slot is being cancelled; resubmission is refused until cancel returns
    #[error("request is being killed")]
    Killed,

    /// Slot already has a request in flight
    #[error("request already in flight")]
    Busy,

    /// Device is gone
    #[error("no such device")]
    NoDevice,

    /// Transport has shut down
    #[error("transport shut down")]
    Shutdown,

    /// Out of resources
    #[error("out of memory")]
    NoMemory,

    /// Request rejected as malformed
    #[error("invalid request")]
    InvalidRequest,

    #[error("{0}")]
    Other(String),
}

impl SubmitError {
    /// Failures that mean the session is already being torn down. These are
    /// expected and never logged.
    pub const fn is_teardown(&self) -> bool {
        matches!(self, SubmitError::Killed | SubmitError::Shutdown)
    }
}
