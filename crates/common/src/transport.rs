//! Transport seam
//!
//! The streams never talk to a bus directly. They hand a [`TransferRequest`]
//! to a [`Transport`] together with the [`CompletionHandler`] that should see
//! the result, and the transport calls back later from its own worker context.
//!
//! Contract every implementation upholds:
//! - `submit` never blocks. It fails with [`SubmitError::Busy`] if the slot
//!   already has a request in flight and with [`SubmitError::Killed`] while the
//!   slot is being cancelled.
//! - Completions for one slot are delivered one at a time. The two slots are
//!   independent and may complete concurrently.
//! - A completion handler may call `submit` for its own slot; the slot counts
//!   as idle for the duration of the handler.
//! - `cancel` blocks until the slot's in-flight request has completed (with
//!   [`TransferStatus::Cancelled`] if it had to be aborted) and its handler has
//!   returned. No callback for that slot fires after `cancel` returns unless a
//!   new request is submitted.

use protocol::{SubmitError, TransferStatus, VendorRequest};
use std::sync::Arc;

/// One of the two asynchronous request slots of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Interrupt IN endpoint, carries the 8-byte report
    Interrupt,
    /// Endpoint 0, carries the alternating vendor polls
    Control,
}

/// A transfer to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRequest {
    /// Read up to `length` bytes from an interrupt IN endpoint
    Interrupt { endpoint: u8, length: usize },
    /// Vendor control read
    Vendor(VendorRequest),
}

impl TransferRequest {
    pub const fn slot(&self) -> Slot {
        match self {
            TransferRequest::Interrupt { .. } => Slot::Interrupt,
            TransferRequest::Vendor(_) => Slot::Control,
        }
    }

    /// Size of the response buffer
    pub const fn length(&self) -> usize {
        match self {
            TransferRequest::Interrupt { length, .. } => *length,
            TransferRequest::Vendor(request) => request.length(),
        }
    }
}

/// Result of one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request: TransferRequest,
    pub status: TransferStatus,
    /// Bytes actually transferred; empty unless `status` is `Success`
    pub payload: Vec<u8>,
}

impl Completion {
    pub fn success(request: TransferRequest, payload: Vec<u8>) -> Self {
        Self {
            request,
            status: TransferStatus::Success,
            payload,
        }
    }

    pub fn failed(request: TransferRequest, status: TransferStatus) -> Self {
        Self {
            request,
            status,
            payload: Vec::new(),
        }
    }
}

/// Receives completions on the transport's worker context
pub trait CompletionHandler: Send + Sync {
    fn on_complete(self: Arc<Self>, completion: Completion);
}

/// Asynchronous transfer engine
pub trait Transport: Send + Sync {
    /// Queue `request`; `handler` is called exactly once when it completes
    fn submit(
        &self,
        request: TransferRequest,
        handler: Arc<dyn CompletionHandler>,
    ) -> Result<(), SubmitError>;

    /// Abort the slot's in-flight request and wait until it has quiesced
    fn cancel(&self, slot: Slot);
}
