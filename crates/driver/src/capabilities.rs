//! Advertised capabilities
//!
//! The identity and the full set of button and axis codes a virtual input
//! device for the flightstick would register.

use protocol::wire::DEVICE_NAME;
use protocol::{Axis, Button, PRODUCT_ID, VENDOR_ID};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ButtonCapability {
    pub id: Button,
    pub code: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisCapability {
    pub id: Axis,
    pub code: u16,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub name: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
    pub buttons: Vec<ButtonCapability>,
    pub axes: Vec<AxisCapability>,
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        name: DEVICE_NAME,
        vendor_id: VENDOR_ID,
        product_id: PRODUCT_ID,
        buttons: Button::ALL
            .iter()
            .map(|&id| ButtonCapability {
                id,
                code: id.code(),
            })
            .collect(),
        axes: Axis::ALL
            .iter()
            .map(|&id| {
                let (min, max) = id.range();
                AxisCapability {
                    id,
                    code: id.code(),
                    min,
                    max,
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_identifier_advertised_once() {
        let caps = capabilities();
        assert_eq!(caps.buttons.len(), 16);
        assert_eq!(caps.axes.len(), 8);

        let codes: HashSet<u16> = caps.buttons.iter().map(|b| b.code).collect();
        assert_eq!(codes.len(), caps.buttons.len());
        let codes: HashSet<u16> = caps.axes.iter().map(|a| a.code).collect();
        assert_eq!(codes.len(), caps.axes.len());
    }

    #[test]
    fn test_identity() {
        let caps = capabilities();
        assert_eq!(caps.name, "Mitsubishi Hori/Namco Flightstick");
        assert_eq!((caps.vendor_id, caps.product_id), (0x06d3, 0x0f10));
    }

    #[test]
    fn test_ternary_axes_range() {
        let caps = capabilities();
        let pad2 = caps
            .axes
            .iter()
            .find(|a| a.id == Axis::Pad2Vertical)
            .unwrap();
        assert_eq!((pad2.min, pad2.max), (-1, 1));
        let x = caps.axes.iter().find(|a| a.id == Axis::X).unwrap();
        assert_eq!((x.min, x.max), (0, 255));
    }
}
