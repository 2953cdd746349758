//! USB subsystem
//!
//! Device discovery and the rusb-backed [`Transport`](common::Transport).
//! rusb transfers block, so every request slot runs on its own thread and
//! device loss reaches the async supervisor through the event bridge.

pub mod device;
pub mod manager;
pub mod transfers;
pub mod transport;

pub use device::{DeviceError, DeviceSummary, FlightstickDevice, ReportInterface};
pub use manager::{DeviceFilter, DeviceManager};
pub use transfers::TransferTimeouts;
pub use transport::RusbTransport;
