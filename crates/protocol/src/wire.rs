//! Wire-level constants for the Hori/Namco flightstick
//!
//! The device speaks two protocols at once: an 8-byte interrupt report on its
//! interrupt IN endpoint, and two vendor-specific control requests on endpoint
//! 0 that each return a 2-byte packed-bit record. Everything in this module
//! must stay bit-exact with the physical device.

use serde::{Deserialize, Serialize};

/// USB Vendor ID (Hori)
pub const VENDOR_ID: u16 = 0x06d3;

/// USB Product ID (flightstick)
pub const PRODUCT_ID: u16 = 0x0f10;

/// Human-readable device name advertised for the virtual input device
pub const DEVICE_NAME: &str = "Mitsubishi Hori/Namco Flightstick";

/// Size of the interrupt report in bytes
pub const REPORT_LEN: usize = 8;

/// Size of each vendor record in bytes
pub const RECORD_LEN: usize = 2;

/// bmRequestType direction bit: device to host
pub const DIR_IN: u8 = 0x80;
/// bmRequestType type field: vendor
pub const TYPE_VENDOR: u8 = 0x40;
/// bmRequestType recipient field: endpoint
pub const RECIP_ENDPOINT: u8 = 0x02;

/// bmRequestType used for both vendor polls
pub const VENDOR_REQUEST_TYPE: u8 = DIR_IN | TYPE_VENDOR | RECIP_ENDPOINT;

/// bRequest selecting record A
pub const REQUEST_RECORD_A: u8 = 0x00;
/// bRequest selecting record B
pub const REQUEST_RECORD_B: u8 = 0x01;

/// wValue for both vendor polls
pub const VENDOR_VALUE: u16 = 0;
/// wIndex for both vendor polls
pub const VENDOR_INDEX: u16 = 1;

/// One of the two vendor poll requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorRequest {
    /// Poll for record A (buttons, pad-1, launch, trigger)
    RecordA,
    /// Poll for record B (pad-3, sw-1, mode select, pad-2)
    RecordB,
}

impl VendorRequest {
    /// bmRequestType
    pub const fn request_type(self) -> u8 {
        VENDOR_REQUEST_TYPE
    }

    /// bRequest
    pub const fn request(self) -> u8 {
        match self {
            VendorRequest::RecordA => REQUEST_RECORD_A,
            VendorRequest::RecordB => REQUEST_RECORD_B,
        }
    }

    /// wValue
    pub const fn value(self) -> u16 {
        VENDOR_VALUE
    }

    /// wIndex
    pub const fn index(self) -> u16 {
        VENDOR_INDEX
    }

    /// wLength, equal to the size of the target record
    pub const fn length(self) -> usize {
        RECORD_LEN
    }

    /// The request polled after this one completes
    pub const fn other(self) -> Self {
        match self {
            VendorRequest::RecordA => VendorRequest::RecordB,
            VendorRequest::RecordB => VendorRequest::RecordA,
        }
    }
}

/// Returns true if `endpoint` is an IN endpoint address
pub const fn is_in_endpoint(endpoint: u8) -> bool {
    endpoint & DIR_IN != 0
}
