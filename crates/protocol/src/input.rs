//! Logical input identifiers
//!
//! Every value the driver emits is addressed by a [`Button`] or an [`Axis`].
//! Each identifier carries the Linux input event code it is advertised under,
//! so a virtual device backend can register capabilities without a second
//! mapping table.

use serde::{Deserialize, Serialize};

/// Digital buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    // Record A
    FireC,
    ButtonD,
    HatPress,
    ButtonSt,
    Pad1Top,
    Pad1Right,
    Pad1Bottom,
    Pad1Left,
    Launch,
    Trigger,
    // Record B
    Pad3Right,
    Pad3Middle,
    Pad3Left,
    Sw1,
    // Interrupt report, pressure thresholded
    PressureA,
    PressureB,
}

impl Button {
    /// All buttons in advertisement order
    pub const ALL: [Button; 16] = [
        Button::FireC,
        Button::ButtonD,
        Button::HatPress,
        Button::ButtonSt,
        Button::Pad1Top,
        Button::Pad1Right,
        Button::Pad1Bottom,
        Button::Pad1Left,
        Button::Launch,
        Button::Trigger,
        Button::Pad3Right,
        Button::Pad3Middle,
        Button::Pad3Left,
        Button::Sw1,
        Button::PressureA,
        Button::PressureB,
    ];

    /// Linux input event code (`EV_KEY`)
    pub const fn code(self) -> u16 {
        match self {
            Button::FireC => codes::BTN_TRIGGER_HAPPY1,
            Button::ButtonD => codes::BTN_TRIGGER_HAPPY2,
            Button::HatPress => codes::BTN_TRIGGER_HAPPY3,
            Button::ButtonSt => codes::BTN_TRIGGER_HAPPY4,
            Button::Pad1Top => codes::BTN_TRIGGER_HAPPY5,
            Button::Pad1Right => codes::BTN_TRIGGER_HAPPY6,
            Button::Pad1Bottom => codes::BTN_TRIGGER_HAPPY7,
            Button::Pad1Left => codes::BTN_TRIGGER_HAPPY8,
            Button::Launch => codes::BTN_THUMB,
            Button::Trigger => codes::BTN_TRIGGER,
            Button::Pad3Right => codes::BTN_THUMB2,
            Button::Pad3Middle => codes::BTN_C,
            Button::Pad3Left => codes::BTN_X,
            Button::Sw1 => codes::BTN_Y,
            Button::PressureA => codes::BTN_A,
            Button::PressureB => codes::BTN_B,
        }
    }
}

/// Absolute axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Rudder,
    Rx,
    Ry,
    Throttle,
    /// Pad-2 left/right
    Pad2Horizontal,
    /// Pad-2 top/bottom
    Pad2Vertical,
}

impl Axis {
    /// All axes in advertisement order
    pub const ALL: [Axis; 8] = [
        Axis::X,
        Axis::Y,
        Axis::Rudder,
        Axis::Rx,
        Axis::Ry,
        Axis::Throttle,
        Axis::Pad2Horizontal,
        Axis::Pad2Vertical,
    ];

    /// The six linear axes in interrupt report byte order
    pub const REPORT_ORDER: [Axis; 6] = [
        Axis::X,
        Axis::Y,
        Axis::Rudder,
        Axis::Rx,
        Axis::Ry,
        Axis::Throttle,
    ];

    /// Linux input event code (`EV_ABS`)
    pub const fn code(self) -> u16 {
        match self {
            Axis::X => codes::ABS_X,
            Axis::Y => codes::ABS_Y,
            Axis::Rudder => codes::ABS_RUDDER,
            Axis::Rx => codes::ABS_RX,
            Axis::Ry => codes::ABS_RY,
            Axis::Throttle => codes::ABS_THROTTLE,
            Axis::Pad2Horizontal => codes::ABS_Z,
            Axis::Pad2Vertical => codes::ABS_RZ,
        }
    }

    /// Inclusive value range
    pub const fn range(self) -> (i32, i32) {
        match self {
            Axis::Pad2Horizontal | Axis::Pad2Vertical => (-1, 1),
            _ => (0, 255),
        }
    }
}

/// One semantic input change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Button { id: Button, pressed: bool },
    Axis { id: Axis, value: i32 },
}

impl InputEvent {
    pub const fn button(id: Button, pressed: bool) -> Self {
        InputEvent::Button { id, pressed }
    }

    pub const fn axis(id: Axis, value: i32) -> Self {
        InputEvent::Axis { id, value }
    }
}

/// Linux input event codes (linux/input-event-codes.h)
pub mod codes {
    pub const BTN_TRIGGER: u16 = 0x120;
    pub const BTN_THUMB: u16 = 0x121;
    pub const BTN_THUMB2: u16 = 0x122;
    pub const BTN_A: u16 = 0x130;
    pub const BTN_B: u16 = 0x131;
    pub const BTN_C: u16 = 0x132;
    pub const BTN_X: u16 = 0x133;
    pub const BTN_Y: u16 = 0x134;
    pub const BTN_TRIGGER_HAPPY1: u16 = 0x2c0;
    pub const BTN_TRIGGER_HAPPY2: u16 = 0x2c1;
    pub const BTN_TRIGGER_HAPPY3: u16 = 0x2c2;
    pub const BTN_TRIGGER_HAPPY4: u16 = 0x2c3;
    pub const BTN_TRIGGER_HAPPY5: u16 = 0x2c4;
    pub const BTN_TRIGGER_HAPPY6: u16 = 0x2c5;
    pub const BTN_TRIGGER_HAPPY7: u16 = 0x2c6;
    pub const BTN_TRIGGER_HAPPY8: u16 = 0x2c7;

    pub const ABS_X: u16 = 0x00;
    pub const ABS_Y: u16 = 0x01;
    pub const ABS_Z: u16 = 0x02;
    pub const ABS_RX: u16 = 0x03;
    pub const ABS_RY: u16 = 0x04;
    pub const ABS_RZ: u16 = 0x05;
    pub const ABS_THROTTLE: u16 = 0x06;
    pub const ABS_RUDDER: u16 = 0x07;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_button_codes_unique() {
        let codes: HashSet<u16> = Button::ALL.iter().map(|b| b.code()).collect();
        assert_eq!(codes.len(), Button::ALL.len());
    }

    #[test]
    fn test_axis_codes_unique() {
        let codes: HashSet<u16> = Axis::ALL.iter().map(|a| a.code()).collect();
        assert_eq!(codes.len(), Axis::ALL.len());
    }

    #[test]
    fn test_axis_ranges() {
        assert_eq!(Axis::X.range(), (0, 255));
        assert_eq!(Axis::Throttle.range(), (0, 255));
        assert_eq!(Axis::Pad2Horizontal.range(), (-1, 1));
        assert_eq!(Axis::Pad2Vertical.range(), (-1, 1));
    }

    #[test]
    fn test_trigger_is_primary_button() {
        assert_eq!(Button::Trigger.code(), codes::BTN_TRIGGER);
        assert_eq!(Button::Launch.code(), codes::BTN_THUMB);
    }

    #[test]
    fn test_event_serialization() {
        let event = InputEvent::button(Button::Trigger, true);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"kind":"button","id":"trigger","pressed":true}"#);
    }
}
