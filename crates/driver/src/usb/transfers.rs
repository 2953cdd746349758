//! USB transfer execution
//!
//! Blocking rusb reads for the two request kinds, with rusb errors mapped to
//! [`TransferStatus`] so the streams can classify them.

use common::{Completion, TransferRequest};
use protocol::{TransferStatus, VendorRequest};
use rusb::{Context, DeviceHandle};
use std::time::Duration;
use tracing::trace;

/// Timing for blocking reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTimeouts {
    /// Bound on one vendor control read
    pub control: Duration,
    /// Bound on one interrupt read attempt; a cancel is noticed between attempts
    pub interrupt_poll: Duration,
}

impl Default for TransferTimeouts {
    fn default() -> Self {
        Self {
            control: Duration::from_millis(500),
            interrupt_poll: Duration::from_millis(20),
        }
    }
}

/// Execute one request to completion.
///
/// `cancelled` is polled between interrupt read attempts and after a control
/// read returns. A cancelled request completes with
/// [`TransferStatus::Cancelled`] and its data is discarded.
pub fn execute(
    handle: &DeviceHandle<Context>,
    request: TransferRequest,
    timeouts: &TransferTimeouts,
    cancelled: &dyn Fn() -> bool,
) -> Completion {
    let result = match request {
        TransferRequest::Interrupt { endpoint, length } => {
            read_interrupt(handle, endpoint, length, timeouts.interrupt_poll, cancelled)
        }
        TransferRequest::Vendor(vendor) => read_vendor(handle, vendor, timeouts.control),
    };

    match result {
        Ok(_) if cancelled() => Completion::failed(request, TransferStatus::Cancelled),
        Ok(payload) => Completion::success(request, payload),
        Err(status) => Completion::failed(request, status),
    }
}

fn read_interrupt(
    handle: &DeviceHandle<Context>,
    endpoint: u8,
    length: usize,
    poll: Duration,
    cancelled: &dyn Fn() -> bool,
) -> Result<Vec<u8>, TransferStatus> {
    let mut buffer = vec![0u8; length];

    loop {
        if cancelled() {
            return Err(TransferStatus::Cancelled);
        }

        match handle.read_interrupt(endpoint, &mut buffer, poll) {
            Ok(len) => {
                buffer.truncate(len);
                trace!("Interrupt IN {:#04x}: {} bytes", endpoint, len);
                return Ok(buffer);
            }
            // Nothing to read yet
            Err(rusb::Error::Timeout) => continue,
            Err(e) => return Err(map_rusb_status(e)),
        }
    }
}

fn read_vendor(
    handle: &DeviceHandle<Context>,
    request: VendorRequest,
    timeout: Duration,
) -> Result<Vec<u8>, TransferStatus> {
    let mut buffer = vec![0u8; request.length()];

    match handle.read_control(
        request.request_type(),
        request.request(),
        request.value(),
        request.index(),
        &mut buffer,
        timeout,
    ) {
        Ok(len) => {
            buffer.truncate(len);
            Ok(buffer)
        }
        Err(e) => Err(map_rusb_status(e)),
    }
}

/// Map rusb error to transfer status
pub fn map_rusb_status(error: rusb::Error) -> TransferStatus {
    match error {
        rusb::Error::Timeout => TransferStatus::TimedOut,
        rusb::Error::Pipe => TransferStatus::Stall,
        rusb::Error::NoDevice => TransferStatus::Disconnected,
        rusb::Error::Interrupted => TransferStatus::Cancelled,
        rusb::Error::Overflow => TransferStatus::Overflow,
        rusb::Error::Io => TransferStatus::Io,
        _ => TransferStatus::Other,
    }
}
