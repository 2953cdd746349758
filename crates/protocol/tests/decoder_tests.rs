//! Decoder property tests
//!
//! Exercises the bit-field decoders over their whole input space:
//! - Interrupt reports pass axis bytes through unchanged
//! - Pressure buttons follow the fixed threshold
//! - Vendor records are deterministic and blind to reserved bits
//! - Pad composition matches the ternary axis contract
//!
//! Run with: `cargo test -p protocol --test decoder_tests`

use protocol::records::{RECORD_A_RESERVED_MASK, RECORD_B_RESERVED_MASK};
use protocol::{
    Axis, Button, InputEvent, PRESSURE_THRESHOLD, PadAxis, RawRecordA, RawRecordB, RawReport,
    decode_pad_axis, decode_record_a, decode_record_b, decode_report,
};
use proptest::prelude::*;

// ============================================================================
// Fixed scenarios
// ============================================================================

mod report_scenarios {
    use super::*;

    #[test]
    fn test_documented_report() {
        let report = decode_report(RawReport([10, 20, 30, 40, 50, 60, 0xFF, 0x00]));
        assert_eq!(
            report.events(),
            [
                InputEvent::axis(Axis::X, 10),
                InputEvent::axis(Axis::Y, 20),
                InputEvent::axis(Axis::Rudder, 30),
                InputEvent::axis(Axis::Rx, 40),
                InputEvent::axis(Axis::Ry, 50),
                InputEvent::axis(Axis::Throttle, 60),
                InputEvent::button(Button::PressureA, false),
                InputEvent::button(Button::PressureB, true),
            ]
        );
    }

    #[test]
    fn test_extreme_axes() {
        let report = decode_report(RawReport([0, 255, 0, 255, 0, 255, 0xC0, 0xBF]));
        assert_eq!(report.axes, [0, 255, 0, 255, 0, 255]);
        assert!(!report.button_a);
        assert!(report.button_b);
    }
}

mod pad_scenarios {
    use super::*;

    const PAD2_TOP: u16 = 1 << 12;
    const PAD2_RIGHT: u16 = 1 << 13;
    const PAD2_BOTTOM: u16 = 1 << 14;
    const PAD2_LEFT: u16 = 1 << 15;

    /// Build a record B with the given pad-2 bits held low
    fn record_b_with_pad2_low(bits: u16) -> RawRecordB {
        RawRecordB(0xFFFF & !bits)
    }

    fn pad2_axes(raw: RawRecordB) -> (i32, i32) {
        let events = decode_record_b(raw).events();
        let value = |axis: Axis| {
            events
                .iter()
                .find_map(|event| match *event {
                    InputEvent::Axis { id, value } if id == axis => Some(value),
                    _ => None,
                })
                .unwrap()
        };
        (value(Axis::Pad2Horizontal), value(Axis::Pad2Vertical))
    }

    #[test]
    fn test_pad2_released() {
        assert_eq!(pad2_axes(record_b_with_pad2_low(0)), (0, 0));
    }

    #[test]
    fn test_pad2_top_raw_zero_is_asserted() {
        assert_eq!(pad2_axes(record_b_with_pad2_low(PAD2_TOP)), (0, -1));
    }

    #[test]
    fn test_pad2_bottom() {
        assert_eq!(pad2_axes(record_b_with_pad2_low(PAD2_BOTTOM)), (0, 1));
    }

    #[test]
    fn test_pad2_left() {
        assert_eq!(pad2_axes(record_b_with_pad2_low(PAD2_LEFT)), (-1, 0));
    }

    #[test]
    fn test_pad2_right() {
        assert_eq!(pad2_axes(record_b_with_pad2_low(PAD2_RIGHT)), (1, 0));
    }

    #[test]
    fn test_pad2_diagonal() {
        assert_eq!(
            pad2_axes(record_b_with_pad2_low(PAD2_TOP | PAD2_LEFT)),
            (-1, -1)
        );
    }

    #[test]
    fn test_pad2_opposing_bits_positive_wins() {
        assert_eq!(
            pad2_axes(record_b_with_pad2_low(PAD2_LEFT | PAD2_RIGHT)),
            (1, 0)
        );
        assert_eq!(
            pad2_axes(record_b_with_pad2_low(PAD2_TOP | PAD2_BOTTOM)),
            (0, 1)
        );
    }

    #[test]
    fn test_pad_axis_table() {
        assert_eq!(decode_pad_axis(false, false), PadAxis::Centered);
        assert_eq!(decode_pad_axis(true, false), PadAxis::Negative);
        assert_eq!(decode_pad_axis(false, true), PadAxis::Positive);
        assert_eq!(decode_pad_axis(true, true), PadAxis::Positive);
    }
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    /// Axis bytes are reported unchanged and pressure follows the threshold.
    #[test]
    fn prop_report_passthrough(bytes in any::<[u8; 8]>()) {
        let report = decode_report(RawReport(bytes));
        prop_assert_eq!(&report.axes[..], &bytes[..6]);
        prop_assert_eq!(report.button_a, bytes[6] < PRESSURE_THRESHOLD);
        prop_assert_eq!(report.button_b, bytes[7] < PRESSURE_THRESHOLD);
    }

    /// Decoding the same report twice gives the same result.
    #[test]
    fn prop_report_idempotent(bytes in any::<[u8; 8]>()) {
        prop_assert_eq!(decode_report(RawReport(bytes)), decode_report(RawReport(bytes)));
    }

    #[test]
    fn prop_record_a_deterministic(bits in any::<u16>()) {
        prop_assert_eq!(decode_record_a(RawRecordA(bits)), decode_record_a(RawRecordA(bits)));
    }

    #[test]
    fn prop_record_b_deterministic(bits in any::<u16>()) {
        prop_assert_eq!(decode_record_b(RawRecordB(bits)), decode_record_b(RawRecordB(bits)));
    }

    /// Flipping reserved bits never changes the decoded record.
    #[test]
    fn prop_record_a_reserved_bits_ignored(bits in any::<u16>(), noise in any::<u16>()) {
        let noisy = bits ^ (noise & RECORD_A_RESERVED_MASK);
        prop_assert_eq!(decode_record_a(RawRecordA(bits)), decode_record_a(RawRecordA(noisy)));
    }

    #[test]
    fn prop_record_b_reserved_bits_ignored(bits in any::<u16>(), noise in any::<u16>()) {
        let noisy = bits ^ (noise & RECORD_B_RESERVED_MASK);
        prop_assert_eq!(decode_record_b(RawRecordB(bits)), decode_record_b(RawRecordB(noisy)));
    }

    /// Every surfaced record A flag is the negation of its raw bit.
    #[test]
    fn prop_record_a_active_low(bits in any::<u16>()) {
        let decoded = decode_record_a(RawRecordA(bits));
        let raw = |bit: u16| bits & (1 << bit) != 0;
        prop_assert_eq!(decoded.fire_c, !raw(0));
        prop_assert_eq!(decoded.button_d, !raw(1));
        prop_assert_eq!(decoded.hat_press, !raw(2));
        prop_assert_eq!(decoded.button_st, !raw(3));
        prop_assert_eq!(decoded.pad1.top, !raw(4));
        prop_assert_eq!(decoded.pad1.right, !raw(5));
        prop_assert_eq!(decoded.pad1.bottom, !raw(6));
        prop_assert_eq!(decoded.pad1.left, !raw(7));
        prop_assert_eq!(decoded.launch, !raw(13));
        prop_assert_eq!(decoded.trigger, !raw(14));
    }

    /// Pad-2 axes always stay within their advertised range.
    #[test]
    fn prop_pad2_axes_in_range(bits in any::<u16>()) {
        let record = decode_record_b(RawRecordB(bits));
        for axis in [record.pad2.horizontal(), record.pad2.vertical()] {
            prop_assert!((-1..=1).contains(&axis.value()));
        }
    }

    /// Raw record bytes round-trip through the little-endian view.
    #[test]
    fn prop_record_bytes_little_endian(bytes in any::<[u8; 2]>()) {
        let raw = RawRecordA::from_bytes(bytes);
        prop_assert_eq!(raw.0, u16::from(bytes[0]) | (u16::from(bytes[1]) << 8));
    }
}
