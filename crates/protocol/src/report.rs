//! Interrupt report decoding
//!
//! The interrupt endpoint delivers an 8-byte report:
//!
//! | byte | meaning |
//! |------|---------|
//! | 0 | X |
//! | 1 | Y |
//! | 2 | rudder |
//! | 3 | RX |
//! | 4 | RY |
//! | 5 | throttle |
//! | 6 | pressure, button A |
//! | 7 | pressure, button B |
//!
//! The two pressure bytes fall as the button is pushed harder; anything below
//! [`PRESSURE_THRESHOLD`] counts as pressed.

use crate::error::{ProtocolError, Result};
use crate::input::{Axis, Button, InputEvent};
use crate::wire::REPORT_LEN;
use serde::{Deserialize, Serialize};

/// Pressure level below which a pressure button is reported as pressed
pub const PRESSURE_THRESHOLD: u8 = 0xC0;

/// Undecoded interrupt report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawReport(pub [u8; REPORT_LEN]);

impl TryFrom<&[u8]> for RawReport {
    type Error = ProtocolError;

    fn try_from(payload: &[u8]) -> Result<Self> {
        payload
            .try_into()
            .map(RawReport)
            .map_err(|_| ProtocolError::PayloadLength {
                expected: REPORT_LEN,
                actual: payload.len(),
            })
    }
}

/// Decoded interrupt report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// X, Y, rudder, RX, RY, throttle
    pub axes: [u8; 6],
    pub button_a: bool,
    pub button_b: bool,
}

impl Report {
    /// Events for one frame
    pub fn events(&self) -> [InputEvent; 8] {
        let axis = |i: usize| InputEvent::axis(Axis::REPORT_ORDER[i], i32::from(self.axes[i]));
        [
            axis(0),
            axis(1),
            axis(2),
            axis(3),
            axis(4),
            axis(5),
            InputEvent::button(Button::PressureA, self.button_a),
            InputEvent::button(Button::PressureB, self.button_b),
        ]
    }
}

pub const fn is_pressed(pressure: u8) -> bool {
    pressure < PRESSURE_THRESHOLD
}

pub const fn decode_report(raw: RawReport) -> Report {
    let b = raw.0;
    Report {
        axes: [b[0], b[1], b[2], b[3], b[4], b[5]],
        button_a: is_pressed(b[6]),
        button_b: is_pressed(b[7]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_report_scenario() {
        let report = decode_report(RawReport([10, 20, 30, 40, 50, 60, 0xFF, 0x00]));
        assert_eq!(report.axes, [10, 20, 30, 40, 50, 60]);
        assert!(!report.button_a);
        assert!(report.button_b);

        let events = report.events();
        assert_eq!(events[0], InputEvent::axis(Axis::X, 10));
        assert_eq!(events[1], InputEvent::axis(Axis::Y, 20));
        assert_eq!(events[2], InputEvent::axis(Axis::Rudder, 30));
        assert_eq!(events[3], InputEvent::axis(Axis::Rx, 40));
        assert_eq!(events[4], InputEvent::axis(Axis::Ry, 50));
        assert_eq!(events[5], InputEvent::axis(Axis::Throttle, 60));
        assert_eq!(events[6], InputEvent::button(Button::PressureA, false));
        assert_eq!(events[7], InputEvent::button(Button::PressureB, true));
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(is_pressed(0xBF));
        assert!(!is_pressed(0xC0));
        assert!(!is_pressed(0xFF));
        assert!(is_pressed(0x00));
    }

    #[test]
    fn test_raw_report_length() {
        assert!(RawReport::try_from(&[0u8; 8][..]).is_ok());
        assert!(matches!(
            RawReport::try_from(&[0u8; 7][..]),
            Err(ProtocolError::PayloadLength {
                expected: 8,
                actual: 7
            })
        ));
        assert!(RawReport::try_from(&[0u8; 64][..]).is_err());
    }
}
