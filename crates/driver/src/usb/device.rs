//! USB device abstraction
//!
//! Wraps the rusb device of one attached flightstick: cached descriptor,
//! report endpoint discovery, and claiming the interface that carries it.

use crate::session::ReportEndpoint;
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device not found")]
    NotFound,
    #[error("permission denied opening device (check udev rules)")]
    PermissionDenied,
    #[error("no interrupt IN endpoint in the active configuration")]
    NoReportEndpoint,
    #[error("endpoint {0:#04x} is not an interrupt IN endpoint of the active configuration")]
    InvalidEndpoint(u8),
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),
}

/// Interrupt IN endpoint and the interface it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportInterface {
    pub interface: u8,
    pub endpoint: ReportEndpoint,
}

/// What `--list-devices` prints for one device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_number: u8,
    pub device_address: u8,
    pub phys: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

pub struct FlightstickDevice {
    device: Device<Context>,
    descriptor: DeviceDescriptor,
    handle: Option<Arc<DeviceHandle<Context>>>,
    claimed_interface: Option<u8>,
}

impl FlightstickDevice {
    /// Reads and caches the device descriptor
    pub fn new(device: Device<Context>) -> Result<Self, rusb::Error> {
        let descriptor = device.device_descriptor()?;

        Ok(Self {
            device,
            descriptor,
            handle: None,
            claimed_interface: None,
        })
    }

    pub fn bus_number(&self) -> u8 {
        self.device.bus_number()
    }

    pub fn device_address(&self) -> u8 {
        self.device.address()
    }

    /// Physical path, `usb-<bus>-<ports>/input0`
    pub fn phys_path(&self) -> String {
        let ports = self.device.port_numbers().unwrap_or_default();
        format_phys_path(self.bus_number(), &ports)
    }

    /// Reads string descriptors if the device can be opened
    pub fn summary(&self) -> DeviceSummary {
        let strings = self
            .device
            .open()
            .ok()
            .map(|handle| self.read_string_descriptors(&handle));
        let (manufacturer, product, serial_number) = strings.unwrap_or((None, None, None));

        DeviceSummary {
            vendor_id: self.descriptor.vendor_id(),
            product_id: self.descriptor.product_id(),
            bus_number: self.bus_number(),
            device_address: self.device_address(),
            phys: self.phys_path(),
            manufacturer,
            product,
            serial_number,
        }
    }

    /// Find the report endpoint: `address` if given, otherwise the first
    /// interrupt IN endpoint of the active configuration.
    pub fn report_interface(&self, address: Option<u8>) -> Result<ReportInterface, DeviceError> {
        let config = self.device.active_config_descriptor()?;

        for interface in config.interfaces() {
            for setting in interface.descriptors() {
                for endpoint in setting.endpoint_descriptors() {
                    let is_report = endpoint.transfer_type() == TransferType::Interrupt
                        && endpoint.direction() == Direction::In;
                    let wanted = address.is_none_or(|a| a == endpoint.address());

                    if is_report && wanted {
                        return Ok(ReportInterface {
                            interface: interface.number(),
                            endpoint: ReportEndpoint {
                                address: endpoint.address(),
                                max_packet_size: usize::from(endpoint.max_packet_size()),
                            },
                        });
                    }
                }
            }
        }

        Err(match address {
            Some(address) => DeviceError::InvalidEndpoint(address),
            None => DeviceError::NoReportEndpoint,
        })
    }

    /// Open the device and claim `interface`, detaching any kernel driver
    /// bound to it first. Returns the shared handle for the transport.
    pub fn open(&mut self, interface: u8) -> Result<Arc<DeviceHandle<Context>>, DeviceError> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }

        let mut handle = self.device.open().map_err(|e| {
            warn!("Failed to open device: {}", e);
            match e {
                rusb::Error::NotFound | rusb::Error::NoDevice => DeviceError::NotFound,
                rusb::Error::Access => DeviceError::PermissionDenied,
                _ => DeviceError::Usb(e),
            }
        })?;

        match handle.kernel_driver_active(interface) {
            Ok(true) => {
                debug!("Detaching kernel driver from interface {}", interface);
                if let Err(e) = handle.detach_kernel_driver(interface) {
                    warn!(
                        "Failed to detach kernel driver from interface {}: {}",
                        interface, e
                    );
                }
            }
            Ok(false) => debug!("No kernel driver active on interface {}", interface),
            Err(e) => debug!(
                "Could not check kernel driver status for interface {}: {}",
                interface, e
            ),
        }

        handle.claim_interface(interface).map_err(|e| {
            warn!("Failed to claim interface {}: {}", interface, e);
            DeviceError::Usb(e)
        })?;
        debug!("Claimed interface {} on {}", interface, self.phys_path());

        let handle = Arc::new(handle);
        self.claimed_interface = Some(interface);
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    /// Release the interface and hand it back to the kernel driver.
    ///
    /// The transport must be dropped first; a handle that is still shared is
    /// only released when its last owner drops it.
    pub fn close(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let Some(interface) = self.claimed_interface.take() else {
            return;
        };

        match Arc::try_unwrap(handle) {
            Ok(mut handle) => {
                if let Err(e) = handle.release_interface(interface) {
                    debug!("Failed to release interface {}: {}", interface, e);
                }
                if let Err(e) = handle.attach_kernel_driver(interface) {
                    debug!(
                        "Could not reattach kernel driver to interface {} (may not have been detached): {}",
                        interface, e
                    );
                }
            }
            Err(_) => warn!("Device handle still in use, interface {} released on drop", interface),
        }

        debug!("Closed {}", self.phys_path());
    }

    fn read_string_descriptors(
        &self,
        handle: &DeviceHandle<Context>,
    ) -> (Option<String>, Option<String>, Option<String>) {
        let read = |index: Option<u8>| {
            index.and_then(|idx| handle.read_string_descriptor_ascii(idx).ok())
        };

        (
            read(self.descriptor.manufacturer_string_index()),
            read(self.descriptor.product_string_index()),
            read(self.descriptor.serial_number_string_index()),
        )
    }
}

impl Drop for FlightstickDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// `usb-<bus>-<port>.<port>.../input0`
pub fn format_phys_path(bus: u8, ports: &[u8]) -> String {
    let ports = ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(".");
    format!("usb-{}-{}/input0", bus, ports)
}
