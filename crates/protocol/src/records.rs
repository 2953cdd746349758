//! Vendor record decoding
//!
//! Each vendor poll returns a 2-byte record of packed single-bit fields
//! (plus one 2-bit enumeration in record B). Bits are numbered from the least
//! significant bit of the first byte, i.e. the record is read as a little-endian
//! `u16`.
//!
//! Every boolean field on the wire is active-low. The negation happens here,
//! once; decoded values are "pressed" / "deflected" in the natural sense.
//!
//! # Record A (request 0x00)
//!
//! ```text
//! bit  0 fire-c        bit  8 reserved
//! bit  1 button D      bit  9 reserved
//! bit  2 hat press     bit 10 reserved
//! bit  3 button ST     bit 11 reserved
//! bit  4 pad-1 top     bit 12 reserved
//! bit  5 pad-1 right   bit 13 launch
//! bit  6 pad-1 bottom  bit 14 trigger
//! bit  7 pad-1 left    bit 15 reserved
//! ```
//!
//! # Record B (request 0x01)
//!
//! ```text
//! bit  0 reserved      bit  8 mode select (low)
//! bit  1 reserved      bit  9 mode select (high)
//! bit  2 reserved      bit 10 reserved
//! bit  3 reserved      bit 11 sw-1
//! bit  4 pad-3 right   bit 12 pad-2 top
//! bit  5 pad-3 middle  bit 13 pad-2 right
//! bit  6 pad-3 left    bit 14 pad-2 bottom
//! bit  7 reserved      bit 15 pad-2 left
//! ```

use crate::axis::{PadAxis, decode_pad_axis};
use crate::error::{ProtocolError, Result};
use crate::input::{Axis, Button, InputEvent};
use crate::wire::RECORD_LEN;
use serde::{Deserialize, Serialize};

/// Bits of record A that carry no surfaced field
pub const RECORD_A_RESERVED_MASK: u16 = 0x9F00;

/// Bits of record B that carry no surfaced field
pub const RECORD_B_RESERVED_MASK: u16 = 0x048F;

mod bits_a {
    pub const FIRE_C: u16 = 0;
    pub const BUTTON_D: u16 = 1;
    pub const HAT: u16 = 2;
    pub const BUTTON_ST: u16 = 3;
    pub const PAD1_TOP: u16 = 4;
    pub const PAD1_RIGHT: u16 = 5;
    pub const PAD1_BOTTOM: u16 = 6;
    pub const PAD1_LEFT: u16 = 7;
    pub const LAUNCH: u16 = 13;
    pub const TRIGGER: u16 = 14;
}

mod bits_b {
    pub const PAD3_RIGHT: u16 = 4;
    pub const PAD3_MIDDLE: u16 = 5;
    pub const PAD3_LEFT: u16 = 6;
    pub const MODE_SELECT: u16 = 8;
    pub const SW1: u16 = 11;
    pub const PAD2_TOP: u16 = 12;
    pub const PAD2_RIGHT: u16 = 13;
    pub const PAD2_BOTTOM: u16 = 14;
    pub const PAD2_LEFT: u16 = 15;
}

/// Read an active-low flag
const fn asserted(bits: u16, bit: u16) -> bool {
    bits & (1 << bit) == 0
}

macro_rules! raw_record {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u16);

        impl $name {
            /// Every field released; what an idle device returns
            pub const IDLE: Self = Self(0xFFFF);

            pub const fn from_bytes(bytes: [u8; RECORD_LEN]) -> Self {
                Self(u16::from_le_bytes(bytes))
            }

            pub const fn to_bytes(self) -> [u8; RECORD_LEN] {
                self.0.to_le_bytes()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::IDLE
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = ProtocolError;

            fn try_from(payload: &[u8]) -> Result<Self> {
                let bytes: [u8; RECORD_LEN] =
                    payload
                        .try_into()
                        .map_err(|_| ProtocolError::PayloadLength {
                            expected: RECORD_LEN,
                            actual: payload.len(),
                        })?;
                Ok(Self::from_bytes(bytes))
            }
        }
    };
}

raw_record!(RawRecordA, "Undecoded record A as returned by vendor request 0x00");
raw_record!(RawRecordB, "Undecoded record B as returned by vendor request 0x01");

/// Four independent directional flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pad {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Pad {
    /// Left/right collapsed into one axis
    pub const fn horizontal(&self) -> PadAxis {
        decode_pad_axis(self.left, self.right)
    }

    /// Top/bottom collapsed into one axis
    pub const fn vertical(&self) -> PadAxis {
        decode_pad_axis(self.top, self.bottom)
    }
}

/// Three-position mode selector
///
/// The selector is labelled M1 - M2 - M3 on the device but reports 2 - 1 - 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModeSelect {
    #[default]
    None,
    M2,
    M1,
    M3,
}

impl ModeSelect {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => ModeSelect::M2,
            2 => ModeSelect::M1,
            3 => ModeSelect::M3,
            _ => ModeSelect::None,
        }
    }
}

/// Decoded record A
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordA {
    pub fire_c: bool,
    pub button_d: bool,
    pub hat_press: bool,
    pub button_st: bool,
    pub pad1: Pad,
    pub launch: bool,
    pub trigger: bool,
}

impl RecordA {
    /// The four primary buttons in wire order
    pub const fn buttons(&self) -> [bool; 4] {
        [self.fire_c, self.button_d, self.hat_press, self.button_st]
    }

    /// Events for one frame
    pub const fn events(&self) -> [InputEvent; 10] {
        [
            InputEvent::button(Button::FireC, self.fire_c),
            InputEvent::button(Button::ButtonD, self.button_d),
            InputEvent::button(Button::HatPress, self.hat_press),
            InputEvent::button(Button::ButtonSt, self.button_st),
            InputEvent::button(Button::Pad1Top, self.pad1.top),
            InputEvent::button(Button::Pad1Right, self.pad1.right),
            InputEvent::button(Button::Pad1Bottom, self.pad1.bottom),
            InputEvent::button(Button::Pad1Left, self.pad1.left),
            InputEvent::button(Button::Launch, self.launch),
            InputEvent::button(Button::Trigger, self.trigger),
        ]
    }
}

/// Three-position pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pad3 {
    pub right: bool,
    pub middle: bool,
    pub left: bool,
}

/// Decoded record B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordB {
    pub pad3: Pad3,
    pub sw1: bool,
    /// Decoded but never emitted
    pub mode_select: ModeSelect,
    pub pad2: Pad,
}

impl RecordB {
    /// Events for one frame. Mode select is not surfaced.
    pub const fn events(&self) -> [InputEvent; 6] {
        [
            InputEvent::button(Button::Pad3Right, self.pad3.right),
            InputEvent::button(Button::Pad3Middle, self.pad3.middle),
            InputEvent::button(Button::Pad3Left, self.pad3.left),
            InputEvent::button(Button::Sw1, self.sw1),
            InputEvent::axis(Axis::Pad2Horizontal, self.pad2.horizontal().value()),
            InputEvent::axis(Axis::Pad2Vertical, self.pad2.vertical().value()),
        ]
    }
}

pub const fn decode_record_a(raw: RawRecordA) -> RecordA {
    use bits_a::*;
    let bits = raw.0;
    RecordA {
        fire_c: asserted(bits, FIRE_C),
        button_d: asserted(bits, BUTTON_D),
        hat_press: asserted(bits, HAT),
        button_st: asserted(bits, BUTTON_ST),
        pad1: Pad {
            top: asserted(bits, PAD1_TOP),
            right: asserted(bits, PAD1_RIGHT),
            bottom: asserted(bits, PAD1_BOTTOM),
            left: asserted(bits, PAD1_LEFT),
        },
        launch: asserted(bits, LAUNCH),
        trigger: asserted(bits, TRIGGER),
    }
}

pub const fn decode_record_b(raw: RawRecordB) -> RecordB {
    use bits_b::*;
    let bits = raw.0;
    RecordB {
        pad3: Pad3 {
            right: asserted(bits, PAD3_RIGHT),
            middle: asserted(bits, PAD3_MIDDLE),
            left: asserted(bits, PAD3_LEFT),
        },
        sw1: asserted(bits, SW1),
        // Not a flag, so no negation
        mode_select: ModeSelect::from_bits((bits >> MODE_SELECT) as u8),
        pad2: Pad {
            top: asserted(bits, PAD2_TOP),
            right: asserted(bits, PAD2_RIGHT),
            bottom: asserted(bits, PAD2_BOTTOM),
            left: asserted(bits, PAD2_LEFT),
        },
    }
}
