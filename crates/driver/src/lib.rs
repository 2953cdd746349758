//! Userspace driver for the Mitsubishi Hori/Namco flightstick
//!
//! The device delivers its state through two concurrent streams: an 8-byte
//! interrupt report carrying the analog axes and the two pressure buttons,
//! and a pair of vendor control requests, polled alternately, carrying
//! everything else. A [`Session`](session::Session) keeps both streams
//! running while a consumer has the device open and turns every completed
//! transfer into one frame on an [`EventSink`](common::EventSink).
//!
//! # Example
//!
//! ```
//! use common::test_utils::{FakeTransport, RecordingSink};
//! use common::transport::Slot;
//! use driver::session::{ReportEndpoint, Session};
//!
//! let transport = FakeTransport::new();
//! let sink = RecordingSink::new();
//! let endpoint = ReportEndpoint { address: 0x81, max_packet_size: 8 };
//! let session = Session::new(transport.clone(), sink.clone(), endpoint);
//!
//! session.open().unwrap();
//! transport.complete_ok(Slot::Interrupt, &[10, 20, 30, 40, 50, 60, 0xFF, 0x00]);
//! assert_eq!(sink.frames().len(), 1);
//!
//! session.close();
//! assert!(!session.is_active());
//! ```

pub mod attach;
pub mod capabilities;
pub mod config;
pub mod output;
pub mod session;
pub mod usb;

pub use config::DriverConfig;
pub use session::{ResetGuard, Session, SessionError};
