//! Vendor poll cycle
//!
//! The device only reports half of its controls on the interrupt endpoint.
//! The rest is read with two vendor control requests that are issued strictly
//! one after the other, A then B then A, forever. Only one of the two is ever
//! in flight. A failed poll still advances the cycle; only a shutdown status
//! ends it. Restarting always begins at A.

use crate::session::stats::{StatsSnapshot, StreamStats};
use common::{Completion, CompletionHandler, EventSink, TransferRequest, Transport, emit_frame};
use protocol::{
    Disposition, InputEvent, ModeSelect, RawRecordA, RawRecordB, RecordA, RecordB, VendorRequest,
    classify, decode_record_a, decode_record_b,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, trace, warn};

/// Which record the cycle is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    PollingA,
    PollingB,
}

impl PollState {
    pub const fn request(self) -> VendorRequest {
        match self {
            PollState::PollingA => VendorRequest::RecordA,
            PollState::PollingB => VendorRequest::RecordB,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            PollState::PollingA => PollState::PollingB,
            PollState::PollingB => PollState::PollingA,
        }
    }

    const fn awaiting(request: VendorRequest) -> Self {
        match request {
            VendorRequest::RecordA => PollState::PollingA,
            VendorRequest::RecordB => PollState::PollingB,
        }
    }
}

/// One decoded vendor record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFrame {
    A(RecordA),
    B(RecordB),
}

impl PollFrame {
    pub fn events(&self) -> Vec<InputEvent> {
        match self {
            PollFrame::A(record) => record.events().to_vec(),
            PollFrame::B(record) => record.events().to_vec(),
        }
    }
}

/// Outcome of feeding one completion to the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollStep {
    /// Frame to emit, if the record decoded
    pub frame: Option<PollFrame>,
    /// Request to submit next, or `None` when the cycle ends
    pub next: Option<VendorRequest>,
}

/// Pure A/B alternation with the last raw record of each kind
#[derive(Debug, Default)]
pub struct PollCycle {
    state: PollState,
    record_a: RawRecordA,
    record_b: RawRecordB,
    mode: ModeSelect,
}

impl PollCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Back to A. Returns the request to submit.
    pub fn restart(&mut self) -> VendorRequest {
        self.state = PollState::PollingA;
        self.state.request()
    }

    pub fn last_record_a(&self) -> RawRecordA {
        self.record_a
    }

    pub fn last_record_b(&self) -> RawRecordB {
        self.record_b
    }

    pub fn mode(&self) -> ModeSelect {
        self.mode
    }

    /// Feed the completion of `request`.
    ///
    /// The cycle advances past whatever request completed, so a stale
    /// completion cannot wedge it on the wrong record.
    pub fn complete(
        &mut self,
        request: VendorRequest,
        disposition: Disposition,
        payload: &[u8],
    ) -> PollStep {
        if !disposition.resubmits() {
            return PollStep {
                frame: None,
                next: None,
            };
        }

        if PollState::awaiting(request) != self.state {
            warn!(
                "vendor poll - completion for {:?} while in {:?}",
                request, self.state
            );
        }

        let frame = if disposition.delivers() {
            self.decode(request, payload)
        } else {
            None
        };

        self.state = PollState::awaiting(request).next();
        PollStep {
            frame,
            next: Some(self.state.request()),
        }
    }

    fn decode(&mut self, request: VendorRequest, payload: &[u8]) -> Option<PollFrame> {
        match request {
            VendorRequest::RecordA => match RawRecordA::try_from(payload) {
                Ok(raw) => {
                    self.record_a = raw;
                    Some(PollFrame::A(decode_record_a(raw)))
                }
                Err(e) => {
                    warn!("vendor poll - record A: {}", e);
                    None
                }
            },
            VendorRequest::RecordB => match RawRecordB::try_from(payload) {
                Ok(raw) => {
                    self.record_b = raw;
                    let record = decode_record_b(raw);
                    if record.mode_select != self.mode {
                        trace!(
                            "mode select {:?} -> {:?}",
                            self.mode, record.mode_select
                        );
                        self.mode = record.mode_select;
                    }
                    Some(PollFrame::B(record))
                }
                Err(e) => {
                    warn!("vendor poll - record B: {}", e);
                    None
                }
            },
        }
    }
}

/// Completion-driven runner for a [`PollCycle`]
pub struct VendorPoll {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
    cycle: Mutex<PollCycle>,
    stats: StreamStats,
}

impl VendorPoll {
    pub fn new(transport: Arc<dyn Transport>, sink: Arc<dyn EventSink>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            sink,
            cycle: Mutex::new(PollCycle::new()),
            stats: StreamStats::default(),
        })
    }

    fn cycle(&self) -> MutexGuard<'_, PollCycle> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PollState {
        self.cycle().state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Restart the cycle at A and submit it. Submission failures are
    /// logged, not returned.
    pub fn start(self: &Arc<Self>) {
        let request = self.cycle().restart();
        self.submit(request);
    }

    fn submit(self: &Arc<Self>, request: VendorRequest) {
        let handler: Arc<dyn CompletionHandler> = self.clone();
        if let Err(e) = self
            .transport
            .submit(TransferRequest::Vendor(request), handler)
        {
            if !e.is_teardown() {
                error!("vendor poll - submit of {:?} failed: {}", request, e);
            }
        }
    }
}

impl CompletionHandler for VendorPoll {
    fn on_complete(self: Arc<Self>, completion: Completion) {
        let TransferRequest::Vendor(request) = completion.request else {
            warn!(
                "vendor poll - ignoring non-vendor completion {:?}",
                completion.request
            );
            return;
        };

        self.stats.record_completion();
        let disposition = classify(completion.status);
        match disposition {
            Disposition::Deliver | Disposition::Shutdown => {}
            Disposition::Ignore => {
                self.stats.record_fault();
                debug!("vendor poll - {:?} timed out", request);
            }
            Disposition::Stall => {
                self.stats.record_fault();
                debug!("vendor poll - {:?} stalled", request);
            }
            Disposition::Unexpected => {
                self.stats.record_fault();
                error!(
                    "vendor poll - {:?} failed with status {:?}",
                    request, completion.status
                );
            }
        }

        let step = self.cycle().complete(request, disposition, &completion.payload);

        if let Some(frame) = step.frame {
            emit_frame(self.sink.as_ref(), &frame.events());
            self.stats.record_frame();
        }

        match step.next {
            Some(next) => self.submit(next),
            None => debug!(
                "vendor poll - stopping with status {:?}",
                completion.status
            ),
        }
    }
}
