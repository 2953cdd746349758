//! Protocol library for the Hori/Namco flightstick
//!
//! This crate holds everything about the device that can be stated without
//! touching a bus: wire constants, the bit-field decoders for the interrupt
//! report and both vendor records, the logical input identifiers they map to,
//! and the transfer status taxonomy used to decide whether a stream keeps
//! polling. Every function here is pure.
//!
//! # Example
//!
//! ```
//! use protocol::{RawReport, decode_report};
//!
//! let report = decode_report(RawReport([10, 20, 30, 40, 50, 60, 0xFF, 0x00]));
//! assert_eq!(report.axes[0], 10);
//! assert!(!report.button_a);
//! assert!(report.button_b);
//! ```
//!
//! # Vendor records
//!
//! ```
//! use protocol::{RawRecordB, decode_record_b};
//!
//! // Pad-2 top held (active-low, bit 12 cleared)
//! let record = decode_record_b(RawRecordB(0xFFFF & !(1 << 12)));
//! assert!(record.pad2.top);
//! assert_eq!(record.pad2.vertical().value(), -1);
//! ```

pub mod axis;
pub mod error;
pub mod input;
pub mod records;
pub mod report;
pub mod status;
pub mod wire;

pub use axis::{PadAxis, decode_pad_axis};
pub use error::{ProtocolError, Result};
pub use input::{Axis, Button, InputEvent};
pub use records::{
    ModeSelect, Pad, Pad3, RawRecordA, RawRecordB, RecordA, RecordB, decode_record_a,
    decode_record_b,
};
pub use report::{PRESSURE_THRESHOLD, RawReport, Report, decode_report};
pub use status::{Disposition, SubmitError, TransferStatus, classify};
pub use wire::{PRODUCT_ID, RECORD_LEN, REPORT_LEN, VENDOR_ID, VendorRequest};
