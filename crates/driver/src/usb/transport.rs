//! rusb-backed transport
//!
//! rusb only offers blocking transfers, so each slot gets a dedicated worker
//! thread that executes one request at a time and runs the completion handler
//! on that thread. Handlers may resubmit on their own slot from inside the
//! callback; the slot is marked idle before the handler runs.
//!
//! `cancel` must not be called from a completion handler on the same slot.

use crate::usb::transfers::{TransferTimeouts, execute};
use async_channel::{Receiver, Sender, TrySendError};
use common::channel::{EventNotifier, TransportEvent};
use common::transport::Slot;
use common::{Completion, CompletionHandler, TransferRequest, Transport};
use protocol::{SubmitError, TransferStatus};
use rusb::{Context, DeviceHandle};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, error};

/// Runs one request to completion on a worker thread. The closure argument
/// reports whether the slot is being cancelled.
pub type Executor = Arc<dyn Fn(TransferRequest, &dyn Fn() -> bool) -> Completion + Send + Sync>;

struct Job {
    request: TransferRequest,
    handler: Arc<dyn CompletionHandler>,
}

#[derive(Debug, Default)]
struct SlotState {
    in_flight: bool,
    in_callback: bool,
    killing: bool,
    closed: bool,
}

#[derive(Default)]
struct SlotShared {
    state: Mutex<SlotState>,
    idle: Condvar,
}

impl SlotShared {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_killing(&self) -> bool {
        self.lock().killing
    }

    fn begin_callback(&self) {
        let mut state = self.lock();
        state.in_flight = false;
        state.in_callback = true;
    }

    fn end_callback(&self) {
        self.lock().in_callback = false;
        self.idle.notify_all();
    }

    fn wait_idle(&self) {
        let mut state = self.lock();
        state.killing = true;
        let mut state = self
            .idle
            .wait_while(state, |s| s.in_flight || s.in_callback)
            .unwrap_or_else(PoisonError::into_inner);
        state.killing = false;
    }
}

struct SlotWorker {
    slot: Slot,
    shared: Arc<SlotShared>,
    jobs: Sender<Job>,
    thread: Option<JoinHandle<()>>,
}

impl SlotWorker {
    fn spawn(slot: Slot, executor: Executor, notifier: EventNotifier) -> std::io::Result<Self> {
        let shared = Arc::new(SlotShared::default());
        let (jobs, rx) = async_channel::bounded(1);

        let thread = std::thread::Builder::new()
            .name(format!("{:?}-transfers", slot).to_lowercase())
            .spawn({
                let shared = shared.clone();
                move || run_worker(slot, shared, executor, rx, notifier)
            })?;

        Ok(Self {
            slot,
            shared,
            jobs,
            thread: Some(thread),
        })
    }

    fn submit(
        &self,
        request: TransferRequest,
        handler: Arc<dyn CompletionHandler>,
    ) -> Result<(), SubmitError> {
        let mut state = self.shared.lock();
        if state.killing {
            return Err(SubmitError::Killed);
        }
        if state.closed {
            return Err(SubmitError::Shutdown);
        }
        if state.in_flight {
            return Err(SubmitError::Busy);
        }

        match self.jobs.try_send(Job { request, handler }) {
            Ok(()) => {
                state.in_flight = true;
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(SubmitError::Busy),
            Err(TrySendError::Closed(_)) => Err(SubmitError::Shutdown),
        }
    }

    fn cancel(&self) {
        debug!("Cancelling {:?} slot", self.slot);
        self.shared.wait_idle();
    }
}

impl Drop for SlotWorker {
    fn drop(&mut self) {
        self.shared.lock().closed = true;
        self.jobs.close();

        let Some(thread) = self.thread.take() else {
            return;
        };
        // Dropped from our own completion handler; the thread exits once
        // the handler returns
        if thread.thread().id() == std::thread::current().id() {
            return;
        }
        self.shared.wait_idle();
        if thread.join().is_err() {
            error!("{:?} transfer thread panicked", self.slot);
        }
    }
}

fn run_worker(
    slot: Slot,
    shared: Arc<SlotShared>,
    executor: Executor,
    jobs: Receiver<Job>,
    notifier: EventNotifier,
) {
    debug!("{:?} transfer thread started", slot);

    while let Ok(Job { request, handler }) = jobs.recv_blocking() {
        let completion = executor(request, &|| shared.is_killing());
        if completion.status == TransferStatus::Disconnected {
            notifier.notify(TransportEvent::DeviceLost);
        }

        shared.begin_callback();
        // The handler is dropped inside the closure, before the slot goes idle
        let result = std::panic::catch_unwind(AssertUnwindSafe(move || {
            handler.on_complete(completion);
        }));
        if let Err(e) = result {
            error!("Panic in {:?} completion handler: {:?}", slot, e);
        }
        shared.end_callback();
    }

    debug!("{:?} transfer thread stopped", slot);
}

/// Transport over an open device handle
pub struct RusbTransport {
    interrupt: SlotWorker,
    control: SlotWorker,
}

impl RusbTransport {
    /// Spawn the slot workers for `handle`
    pub fn new(
        handle: Arc<DeviceHandle<Context>>,
        timeouts: TransferTimeouts,
        notifier: EventNotifier,
    ) -> std::io::Result<Self> {
        let executor: Executor = Arc::new(
            move |request: TransferRequest, cancelled: &dyn Fn() -> bool| {
                execute(&handle, request, &timeouts, cancelled)
            },
        );
        Self::with_executor(executor, notifier)
    }

    /// Spawn the slot workers around an arbitrary executor
    pub fn with_executor(executor: Executor, notifier: EventNotifier) -> std::io::Result<Self> {
        Ok(Self {
            interrupt: SlotWorker::spawn(Slot::Interrupt, executor.clone(), notifier.clone())?,
            control: SlotWorker::spawn(Slot::Control, executor, notifier)?,
        })
    }

    fn worker(&self, slot: Slot) -> &SlotWorker {
        match slot {
            Slot::Interrupt => &self.interrupt,
            Slot::Control => &self.control,
        }
    }
}

impl Transport for RusbTransport {
    fn submit(
        &self,
        request: TransferRequest,
        handler: Arc<dyn CompletionHandler>,
    ) -> Result<(), SubmitError> {
        self.worker(request.slot()).submit(request, handler)
    }

    fn cancel(&self, slot: Slot) {
        self.worker(slot).cancel();
    }
}
