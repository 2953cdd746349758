//! Session lifecycle
//!
//! A [`Session`] owns the two transfer streams of one attached device and
//! gates them on the open/close, suspend/resume and reset callbacks. All
//! lifecycle operations serialize on one lock. Stream handlers never take
//! that lock, so cancelling a stream while holding it cannot deadlock
//! against an in-progress completion.

pub mod report_stream;
pub mod stats;
pub mod vendor_poll;

pub use report_stream::{ReportEndpoint, ReportStream};
pub use stats::StatsSnapshot;
pub use vendor_poll::{PollCycle, PollState, VendorPoll};

use common::transport::Slot;
use common::{EventSink, Transport};
use protocol::SubmitError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The report stream could not be (re)started
    #[error("report stream submission failed: {0}")]
    Io(#[source] SubmitError),
}

#[derive(Debug, Default)]
struct Lifecycle {
    /// A consumer has the device open
    active: bool,
}

/// Counters for both streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub report: StatsSnapshot,
    pub poll: StatsSnapshot,
}

pub struct Session {
    transport: Arc<dyn Transport>,
    report: Arc<ReportStream>,
    poll: Arc<VendorPoll>,
    lifecycle: Mutex<Lifecycle>,
}

impl Session {
    pub fn new(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn EventSink>,
        endpoint: ReportEndpoint,
    ) -> Self {
        Self {
            report: ReportStream::new(transport.clone(), sink.clone(), endpoint),
            poll: VendorPoll::new(transport.clone(), sink),
            transport,
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start both streams.
    ///
    /// Fails if the report stream cannot be submitted; the session then stays
    /// inactive and no vendor poll is issued. Opening an open session is a
    /// no-op.
    pub fn open(&self) -> Result<(), SessionError> {
        let mut lifecycle = self.lock();
        if lifecycle.active {
            debug!("session already open");
            return Ok(());
        }

        self.report.submit().map_err(|e| {
            error!("open - report stream submission failed: {}", e);
            SessionError::Io(e)
        })?;

        lifecycle.active = true;
        self.poll.start();
        info!("session opened");
        Ok(())
    }

    /// Stop both streams and wait for them to go idle. Safe to call on a
    /// session that was never opened, and more than once.
    pub fn close(&self) {
        let mut lifecycle = self.lock();
        self.kill_streams();
        if lifecycle.active {
            let stats = self.stats();
            info!(
                "session closed ({} reports, {} vendor records)",
                stats.report.frames, stats.poll.frames
            );
        }
        lifecycle.active = false;
    }

    /// Quiesce both streams. The session stays active so that `resume`
    /// restarts them.
    pub fn suspend(&self) {
        let lifecycle = self.lock();
        if lifecycle.active {
            debug!("suspend - stopping streams");
            self.kill_streams();
        }
    }

    /// Restart both streams if the session is active. The vendor poll
    /// restarts at record A even when the report stream fails.
    pub fn resume(&self) -> Result<(), SessionError> {
        let lifecycle = self.lock();
        self.restart(&lifecycle)
    }

    /// Resume after the device lost its state. No device state is cached,
    /// so this is a plain resume.
    pub fn reset_resume(&self) -> Result<(), SessionError> {
        self.resume()
    }

    /// Stop both streams and hold the lifecycle lock until the returned guard
    /// is finished with [`ResetGuard::post_reset`] or dropped.
    pub fn pre_reset(&self) -> ResetGuard<'_> {
        let lifecycle = self.lock();
        debug!("pre-reset - stopping streams");
        self.kill_streams();
        ResetGuard {
            session: self,
            lifecycle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn poll_state(&self) -> PollState {
        self.poll.state()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            report: self.report.stats(),
            poll: self.poll.stats(),
        }
    }

    fn restart(&self, lifecycle: &Lifecycle) -> Result<(), SessionError> {
        if !lifecycle.active {
            return Ok(());
        }

        let result = self.report.submit().map_err(|e| {
            error!("restart - report stream submission failed: {}", e);
            SessionError::Io(e)
        });
        self.poll.start();
        result
    }

    fn kill_streams(&self) {
        self.transport.cancel(Slot::Interrupt);
        self.transport.cancel(Slot::Control);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.kill_streams();
    }
}

/// Proof that a reset is in progress
///
/// The lifecycle lock is held for the guard's whole lifetime, so no open,
/// close or resume can run while the device resets.
#[must_use = "dropping the guard without post_reset leaves the streams stopped"]
pub struct ResetGuard<'a> {
    session: &'a Session,
    lifecycle: MutexGuard<'a, Lifecycle>,
}

impl ResetGuard<'_> {
    /// Restart the streams (if active) and release the lifecycle lock
    pub fn post_reset(self) -> Result<(), SessionError> {
        debug!("post-reset - restarting streams");
        self.session.restart(&self.lifecycle)
    }
}
