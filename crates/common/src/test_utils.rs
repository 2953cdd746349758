//! Test utilities for the flightstick driver
//!
//! Provides an in-memory [`Transport`] and [`EventSink`] so the streams and
//! the lifecycle controller can be driven deterministically from a test.
//!
//! # Example
//!
//! ```
//! use common::test_utils::FakeTransport;
//! use common::transport::Slot;
//!
//! let transport = FakeTransport::new();
//! assert!(transport.pending(Slot::Interrupt).is_none());
//! assert!(!transport.complete_ok(Slot::Interrupt, &[0; 8]));
//! ```

use crate::sink::{EventSink, SinkEvent};
use crate::transport::{Completion, CompletionHandler, Slot, TransferRequest, Transport};
use protocol::{Axis, Button, SubmitError, TransferStatus};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// Default test timeout (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

struct Pending {
    request: TransferRequest,
    handler: Arc<dyn CompletionHandler>,
}

#[derive(Default)]
struct FakeState {
    pending: HashMap<Slot, Pending>,
    /// Slots whose handler is currently running
    in_callback: HashSet<Slot>,
    /// Slots being cancelled
    killing: HashSet<Slot>,
    fail_next: HashMap<Slot, SubmitError>,
    submissions: Vec<TransferRequest>,
    cancels: Vec<Slot>,
}

/// In-memory transport
///
/// Requests stay pending until the test calls [`FakeTransport::complete`],
/// which runs the handler on the calling thread. `cancel` honours the full
/// transport contract: it aborts the pending request with
/// `TransferStatus::Cancelled`, refuses resubmission with
/// `SubmitError::Killed` meanwhile, and waits for a handler running on
/// another thread to return.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
    idle: Condvar,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Complete the slot's pending request. Returns false if nothing was
    /// in flight.
    pub fn complete(&self, slot: Slot, status: TransferStatus, payload: &[u8]) -> bool {
        let pending = {
            let mut state = self.lock();
            match state.pending.remove(&slot) {
                Some(pending) => {
                    state.in_callback.insert(slot);
                    pending
                }
                None => return false,
            }
        };

        let completion = if status == TransferStatus::Success {
            Completion::success(pending.request, payload.to_vec())
        } else {
            Completion::failed(pending.request, status)
        };
        pending.handler.on_complete(completion);

        self.lock().in_callback.remove(&slot);
        self.idle.notify_all();
        true
    }

    /// Complete the slot's pending request successfully
    pub fn complete_ok(&self, slot: Slot, payload: &[u8]) -> bool {
        self.complete(slot, TransferStatus::Success, payload)
    }

    /// Request currently in flight on `slot`
    pub fn pending(&self, slot: Slot) -> Option<TransferRequest> {
        self.lock().pending.get(&slot).map(|p| p.request)
    }

    /// Every accepted submission, in order
    pub fn submissions(&self) -> Vec<TransferRequest> {
        self.lock().submissions.clone()
    }

    /// Accepted submissions on one slot, in order
    pub fn submissions_on(&self, slot: Slot) -> Vec<TransferRequest> {
        self.lock()
            .submissions
            .iter()
            .filter(|r| r.slot() == slot)
            .copied()
            .collect()
    }

    /// Make the next submission on `slot` fail with `error`
    pub fn fail_next_submit(&self, slot: Slot, error: SubmitError) {
        self.lock().fail_next.insert(slot, error);
    }

    /// Number of cancel calls seen for `slot`
    pub fn cancel_count(&self, slot: Slot) -> usize {
        self.lock().cancels.iter().filter(|s| **s == slot).count()
    }

    /// Forget recorded submissions and cancels
    pub fn clear_history(&self) {
        let mut state = self.lock();
        state.submissions.clear();
        state.cancels.clear();
    }
}

impl Transport for FakeTransport {
    fn submit(
        &self,
        request: TransferRequest,
        handler: Arc<dyn CompletionHandler>,
    ) -> Result<(), SubmitError> {
        let slot = request.slot();
        let mut state = self.lock();

        if state.killing.contains(&slot) {
            return Err(SubmitError::Killed);
        }
        if let Some(error) = state.fail_next.remove(&slot) {
            return Err(error);
        }
        if state.pending.contains_key(&slot) {
            return Err(SubmitError::Busy);
        }

        state.submissions.push(request);
        state.pending.insert(slot, Pending { request, handler });
        Ok(())
    }

    fn cancel(&self, slot: Slot) {
        let pending = {
            let mut state = self.lock();
            state.cancels.push(slot);
            state.killing.insert(slot);
            state = self
                .idle
                .wait_while(state, |s| s.in_callback.contains(&slot))
                .unwrap_or_else(PoisonError::into_inner);
            state.pending.remove(&slot)
        };

        if let Some(pending) = pending {
            pending
                .handler
                .on_complete(Completion::failed(pending.request, TransferStatus::Cancelled));
        }

        self.lock().killing.remove(&slot);
    }
}

/// Sink that records every call
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SinkEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every recorded call, in order
    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().clone()
    }

    /// Recorded calls grouped into frames; a trailing unsynced run is dropped
    pub fn frames(&self) -> Vec<Vec<SinkEvent>> {
        let mut frames = Vec::new();
        let mut current = Vec::new();
        for event in self.lock().iter() {
            match event {
                SinkEvent::Sync => frames.push(std::mem::take(&mut current)),
                other => current.push(*other),
            }
        }
        frames
    }

    pub fn sync_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Sync))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn report_axis(&self, axis: Axis, value: i32) {
        self.lock().push(SinkEvent::Axis { id: axis, value });
    }

    fn report_button(&self, button: Button, pressed: bool) {
        self.lock().push(SinkEvent::Button {
            id: button,
            pressed,
        });
    }

    fn sync(&self) {
        self.lock().push(SinkEvent::Sync);
    }
}

/// Tracing layer that records the level of every event
///
/// Install it for the current thread with [`LevelRecorder::record`]. The
/// fake transport runs handlers on the calling thread, so everything a
/// completion logs is captured.
#[derive(Clone, Default)]
pub struct LevelRecorder {
    levels: Arc<Mutex<Vec<Level>>>,
}

impl LevelRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with this recorder as the thread's default subscriber
    pub fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn levels(&self) -> Vec<Level> {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded events at exactly `level`
    pub fn count(&self, level: Level) -> usize {
        self.levels().iter().filter(|l| **l == level).count()
    }

    pub fn clear(&self) {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<S: Subscriber> Layer<S> for LevelRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event.metadata().level());
    }
}

/// Timeout wrapper for async tests
///
/// Wraps an async operation with a timeout to prevent tests from hanging.
pub async fn with_timeout<T, F>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { duration })
}

/// Error returned when a test times out
#[derive(Debug)]
pub struct TimeoutError {
    /// The timeout duration that was exceeded
    pub duration: Duration,
}

impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Test timed out after {:?}", self.duration)
    }
}

impl std::error::Error for TimeoutError {}
