//! Interrupt report stream
//!
//! One interrupt read is kept in flight for as long as the stream runs. Every
//! completion is classified and, unless the session is shutting down, the
//! read is resubmitted immediately, whatever the payload looked like.

use crate::session::stats::{StatsSnapshot, StreamStats};
use common::{Completion, CompletionHandler, EventSink, TransferRequest, Transport, emit_frame};
use protocol::{Disposition, RawReport, SubmitError, classify, decode_report};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Interrupt IN endpoint the report arrives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportEndpoint {
    /// Endpoint address, IN bit set
    pub address: u8,
    /// Read length; the device's max packet size
    pub max_packet_size: usize,
}

impl ReportEndpoint {
    pub const fn request(&self) -> TransferRequest {
        TransferRequest::Interrupt {
            endpoint: self.address,
            length: self.max_packet_size,
        }
    }
}

pub struct ReportStream {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
    endpoint: ReportEndpoint,
    stats: StreamStats,
}

impl ReportStream {
    pub fn new(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn EventSink>,
        endpoint: ReportEndpoint,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            sink,
            endpoint,
            stats: StreamStats::default(),
        })
    }

    /// Submit the read. The caller decides what a failure means.
    pub fn submit(self: &Arc<Self>) -> Result<(), SubmitError> {
        let handler: Arc<dyn CompletionHandler> = self.clone();
        self.transport.submit(self.endpoint.request(), handler)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn resubmit(self: &Arc<Self>) {
        if let Err(e) = self.submit() {
            if !e.is_teardown() {
                error!(
                    "report stream - resubmit on endpoint {:#04x} failed: {}",
                    self.endpoint.address, e
                );
            }
        }
    }

    fn deliver(&self, payload: &[u8]) {
        match RawReport::try_from(payload) {
            Ok(raw) => {
                let report = decode_report(raw);
                trace!("report: {:?}", report);
                emit_frame(self.sink.as_ref(), &report.events());
                self.stats.record_frame();
            }
            Err(e) => warn!("report stream - dropping report: {}", e),
        }
    }
}

impl CompletionHandler for ReportStream {
    fn on_complete(self: Arc<Self>, completion: Completion) {
        self.stats.record_completion();

        match classify(completion.status) {
            Disposition::Deliver => self.deliver(&completion.payload),
            Disposition::Ignore => {
                self.stats.record_fault();
                debug!("report stream - timed out, was the device unplugged?");
            }
            Disposition::Shutdown => {
                debug!(
                    "report stream - shutting down with status {:?}",
                    completion.status
                );
                return;
            }
            Disposition::Stall => {
                self.stats.record_fault();
                debug!("report stream - endpoint stalled");
            }
            Disposition::Unexpected => {
                self.stats.record_fault();
                error!(
                    "report stream - unexpected status received: {:?}",
                    completion.status
                );
            }
        }

        self.resubmit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SinkEvent;
    use common::test_utils::{FakeTransport, LevelRecorder, RecordingSink};
    use common::transport::Slot;
    use protocol::{Axis, TransferStatus};
    use tracing::Level;

    const ENDPOINT: ReportEndpoint = ReportEndpoint {
        address: 0x81,
        max_packet_size: 8,
    };

    fn setup() -> (Arc<FakeTransport>, Arc<RecordingSink>, Arc<ReportStream>) {
        let transport = FakeTransport::new();
        let sink = RecordingSink::new();
        let stream = ReportStream::new(transport.clone(), sink.clone(), ENDPOINT);
        (transport, sink, stream)
    }

    #[test]
    fn test_submit_issues_interrupt_read() {
        let (transport, _sink, stream) = setup();
        stream.submit().unwrap();
        assert_eq!(
            transport.pending(Slot::Interrupt),
            Some(TransferRequest::Interrupt {
                endpoint: 0x81,
                length: 8
            })
        );
    }

    #[test]
    fn test_report_emits_one_frame_and_resubmits() {
        let (transport, sink, stream) = setup();
        stream.submit().unwrap();

        transport.complete_ok(Slot::Interrupt, &[1, 2, 3, 4, 5, 6, 0xFF, 0xFF]);

        let frames = sink.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 8);
        assert_eq!(frames[0][0], SinkEvent::Axis { id: Axis::X, value: 1 });
        assert!(transport.pending(Slot::Interrupt).is_some());
        assert_eq!(stream.stats().frames, 1);
    }

    #[test]
    fn test_short_report_is_skipped_but_resubmitted() {
        let (transport, sink, stream) = setup();
        stream.submit().unwrap();

        let recorder = LevelRecorder::new();
        recorder.record(|| {
            transport.complete_ok(Slot::Interrupt, &[1, 2, 3]);
            transport.complete_ok(Slot::Interrupt, &[0; 64]);
        });

        assert!(sink.is_empty());
        assert!(transport.pending(Slot::Interrupt).is_some());
        assert_eq!(recorder.count(Level::WARN), 2);
        assert_eq!(stream.stats().frames, 0);
    }

    #[test]
    fn test_unexpected_status_logs_error() {
        let (transport, _sink, stream) = setup();
        stream.submit().unwrap();

        let recorder = LevelRecorder::new();
        recorder.record(|| transport.complete(Slot::Interrupt, TransferStatus::Io, &[]));

        assert_eq!(recorder.count(Level::ERROR), 1);
        assert!(transport.pending(Slot::Interrupt).is_some());
    }

    #[test]
    fn test_faults_resubmit() {
        let (transport, sink, stream) = setup();
        stream.submit().unwrap();

        for status in [
            TransferStatus::TimedOut,
            TransferStatus::Stall,
            TransferStatus::Io,
            TransferStatus::Overflow,
        ] {
            assert!(transport.complete(Slot::Interrupt, status, &[]));
            assert!(transport.pending(Slot::Interrupt).is_some());
        }
        assert!(sink.is_empty());
        assert_eq!(stream.stats().faults, 4);
    }

    #[test]
    fn test_shutdown_stops() {
        let (transport, sink, stream) = setup();
        stream.submit().unwrap();

        transport.complete(Slot::Interrupt, TransferStatus::Disconnected, &[]);

        assert!(transport.pending(Slot::Interrupt).is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_failed_resubmit_is_not_fatal() {
        let (transport, _sink, stream) = setup();
        stream.submit().unwrap();
        transport.fail_next_submit(Slot::Interrupt, SubmitError::NoMemory);

        transport.complete_ok(Slot::Interrupt, &[0; 8]);

        assert!(transport.pending(Slot::Interrupt).is_none());
        assert_eq!(stream.stats().completions, 1);
    }
}
