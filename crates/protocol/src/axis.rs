//! Ternary pad axes
//!
//! A pad cluster reports each direction as an independent flag. Two opposing
//! flags collapse into a single axis with three positions.

use serde::{Deserialize, Serialize};

/// Position of a ternary axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PadAxis {
    /// Negative direction asserted (left / top)
    Negative,
    /// Neither direction asserted
    #[default]
    Centered,
    /// Positive direction asserted (right / bottom)
    Positive,
}

impl PadAxis {
    /// Axis value as reported to the event sink
    pub const fn value(self) -> i32 {
        match self {
            PadAxis::Negative => -1,
            PadAxis::Centered => 0,
            PadAxis::Positive => 1,
        }
    }
}

/// Collapse two opposing, already-negated direction flags into one axis.
///
/// The device never guarantees exclusivity. When both directions are asserted
/// the positive direction wins.
pub const fn decode_pad_axis(negative: bool, positive: bool) -> PadAxis {
    match (negative, positive) {
        (_, true) => PadAxis::Positive,
        (true, false) => PadAxis::Negative,
        (false, false) => PadAxis::Centered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered() {
        assert_eq!(decode_pad_axis(false, false), PadAxis::Centered);
        assert_eq!(decode_pad_axis(false, false).value(), 0);
    }

    #[test]
    fn test_negative() {
        assert_eq!(decode_pad_axis(true, false).value(), -1);
    }

    #[test]
    fn test_positive() {
        assert_eq!(decode_pad_axis(false, true).value(), 1);
    }

    #[test]
    fn test_both_asserted_positive_wins() {
        assert_eq!(decode_pad_axis(true, true), PadAxis::Positive);
        assert_eq!(decode_pad_axis(true, true).value(), 1);
    }
}
