//! Common utilities for the flightstick driver
//!
//! This crate provides the seams shared by the driver and its tests: the
//! transport abstraction the streams submit through, the event sink decoded
//! frames leave through, the async channel bridge from transport worker
//! threads to the Tokio runtime, error handling and logging setup.

pub mod channel;
pub mod error;
pub mod logging;
pub mod sink;
pub mod test_utils;
pub mod transport;

pub use channel::{EventBridge, EventNotifier, TransportEvent, create_event_bridge};
pub use error::{Error, Result};
pub use logging::setup_logging;
pub use sink::{ChannelSink, EventSink, InputState, SinkEvent, emit_frame};
pub use transport::{Completion, CompletionHandler, Slot, TransferRequest, Transport};
