//! USB device manager
//!
//! Enumerates the bus looking for devices that match the configured
//! vendor/product pair.

use crate::usb::device::{DeviceSummary, FlightstickDevice};
use protocol::{PRODUCT_ID, VENDOR_ID};
use rusb::{Context, UsbContext};
use tracing::{debug, warn};

/// Vendor/product pair a device must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
        }
    }
}

impl DeviceFilter {
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

pub struct DeviceManager {
    context: Context,
    filter: DeviceFilter,
}

impl DeviceManager {
    pub fn new(filter: DeviceFilter) -> Result<Self, rusb::Error> {
        Ok(Self {
            context: Context::new()?,
            filter,
        })
    }

    pub fn filter(&self) -> DeviceFilter {
        self.filter
    }

    /// Every matching device currently on the bus
    pub fn enumerate(&self) -> Result<Vec<FlightstickDevice>, rusb::Error> {
        let mut found = Vec::new();

        for device in self.context.devices()?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(d) => d,
                Err(e) => {
                    debug!(
                        "Skipping device bus={} addr={}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };

            if !self
                .filter
                .matches(descriptor.vendor_id(), descriptor.product_id())
            {
                continue;
            }

            match FlightstickDevice::new(device) {
                Ok(device) => found.push(device),
                Err(e) => warn!("Failed to read matching device: {}", e),
            }
        }

        debug!(
            "Found {} device(s) matching {:04x}:{:04x}",
            found.len(),
            self.filter.vendor_id,
            self.filter.product_id
        );
        Ok(found)
    }

    /// First matching device, if any
    pub fn find(&self) -> Result<Option<FlightstickDevice>, rusb::Error> {
        Ok(self.enumerate()?.into_iter().next())
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceSummary>, rusb::Error> {
        Ok(self.enumerate()?.iter().map(FlightstickDevice::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_flightstick() {
        let filter = DeviceFilter::default();
        assert!(filter.matches(0x06d3, 0x0f10));
        assert!(!filter.matches(0x06d3, 0x0f11));
        assert!(!filter.matches(0x1234, 0x0f10));
    }

    #[test]
    fn test_custom_filter() {
        let filter = DeviceFilter {
            vendor_id: 0x1234,
            product_id: 0x5678,
        };
        assert!(filter.matches(0x1234, 0x5678));
        assert!(!filter.matches(0x06d3, 0x0f10));
    }
}
